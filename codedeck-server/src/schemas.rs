use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewRoomSchema {
    /// Client-chosen room id, generated when omitted
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(email)]
    pub creator_email: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteRoomSchema {
    #[validate(email)]
    pub requestor: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecuteSchema {
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(length(min = 1, max = 64))]
    pub language: String,
    pub stdin: Option<String>,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn room_bodies_use_camel_case() {
        let body: NewRoomSchema = serde_json::from_str(
            r#"{"id": "abc123", "name": "My room", "creatorEmail": "alice@x.com"}"#,
        )
        .unwrap();

        assert_eq!(body.id.as_deref(), Some("abc123"));
        assert_eq!(body.creator_email, "alice@x.com");
        assert!(body.validate().is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<NewRoomSchema, _> = serde_json::from_str(
            r#"{"name": "My room", "creatorEmail": "alice@x.com", "extra": true}"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn invalid_emails_fail_validation() {
        let body: NewRoomSchema =
            serde_json::from_str(r#"{"name": "My room", "creatorEmail": "not-an-email"}"#).unwrap();

        assert!(body.validate().is_err());
    }

    #[test]
    fn execute_bodies_require_code() {
        let body: ExecuteSchema =
            serde_json::from_str(r#"{"code": "", "language": "python"}"#).unwrap();

        assert!(body.validate().is_err());
    }
}
