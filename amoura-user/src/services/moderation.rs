use serde::Deserialize;

/// Response shape of the hosted image-screening function.
#[derive(Debug, Deserialize)]
pub struct ModerationResponse {
    pub valid: bool,
    #[serde(default, rename = "isCelebrity")]
    pub is_celebrity: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationVerdict {
    pub valid: bool,
    pub is_celebrity: bool,
}

impl ModerationVerdict {
    /// The verdict used whenever the screening service cannot answer.
    /// Moderation fails open: an outage must never block an upload.
    pub fn fail_open() -> Self {
        Self { valid: true, is_celebrity: false }
    }
}

pub fn verdict_from_response(resp: ModerationResponse) -> ModerationVerdict {
    if let Some(err) = &resp.error {
        tracing::warn!(error = %err, "moderation function reported an internal error, failing open");
        return ModerationVerdict::fail_open();
    }
    ModerationVerdict {
        valid: resp.valid,
        is_celebrity: resp.is_celebrity,
    }
}

/// Screen an uploaded photo via the moderation function.
///
/// Every failure mode (transport, non-2xx, body parse) degrades to
/// [`ModerationVerdict::fail_open`].
pub async fn screen_photo(
    client: &reqwest::Client,
    moderation_url: &str,
    photo_url: &str,
) -> ModerationVerdict {
    let result = client
        .post(moderation_url)
        .json(&serde_json::json!({ "image_url": photo_url }))
        .send()
        .await;

    let resp = match result {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            tracing::warn!(status = %resp.status(), "moderation function returned an error status, failing open");
            return ModerationVerdict::fail_open();
        }
        Err(e) => {
            tracing::warn!(error = %e, "moderation function unreachable, failing open");
            return ModerationVerdict::fail_open();
        }
    };

    match resp.json::<ModerationResponse>().await {
        Ok(parsed) => verdict_from_response(parsed),
        Err(e) => {
            tracing::warn!(error = %e, "moderation response unparseable, failing open");
            ModerationVerdict::fail_open()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_photo_passes() {
        let resp: ModerationResponse =
            serde_json::from_value(serde_json::json!({ "valid": true })).unwrap();
        let verdict = verdict_from_response(resp);
        assert!(verdict.valid);
        assert!(!verdict.is_celebrity);
    }

    #[test]
    fn rejected_photo_fails() {
        let resp: ModerationResponse =
            serde_json::from_value(serde_json::json!({ "valid": false })).unwrap();
        assert!(!verdict_from_response(resp).valid);
    }

    #[test]
    fn celebrity_flag_carried() {
        let resp: ModerationResponse =
            serde_json::from_value(serde_json::json!({ "valid": true, "isCelebrity": true }))
                .unwrap();
        let verdict = verdict_from_response(resp);
        assert!(verdict.valid);
        assert!(verdict.is_celebrity);
    }

    #[test]
    fn internal_error_fails_open() {
        let resp: ModerationResponse = serde_json::from_value(
            serde_json::json!({ "valid": false, "error": "vision api quota exceeded" }),
        )
        .unwrap();
        assert_eq!(verdict_from_response(resp), ModerationVerdict::fail_open());
    }
}
