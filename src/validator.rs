use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use attendly_core::AppError;

fn format_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().filter_map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .or_else(|| Some(format!("{} is invalid", field)))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runs `validator` rules outside the extractor, e.g. on query parameters.
pub fn validate<T: Validate>(value: &T) -> Result<(), AppError> {
    value
        .validate()
        .map_err(|errors| AppError::unprocessable(anyhow!("{}", format_errors(&errors))))
}

/// JSON body that has passed its `validator` rules. Malformed bodies are
/// 400, rule violations 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

/// Turns a serde data error such as
/// ``entries[0].status: unknown variant `bogus`, expected one of `present`, `absent` at line 1 column 40``
/// into a message naming the field and what it accepts.
pub fn describe_data_error(text: &str) -> Option<String> {
    let detail = text
        .split_once("target type: ")
        .map_or(text, |(_, rest)| rest);
    let detail = match detail.rfind(" at line ") {
        Some(idx) => &detail[..idx],
        None => detail,
    };
    let (field, cause) = detail.split_once(": ")?;
    if field.contains(' ') {
        return None;
    }

    if let Some(rest) = cause.strip_prefix("unknown variant `") {
        let (given, expected) = rest.split_once("`, expected ")?;
        let allowed = expected
            .trim_start_matches("one of ")
            .split(['`', ',', ' '])
            .filter(|part| !part.is_empty() && *part != "or")
            .collect::<Vec<_>>()
            .join(", ");
        return Some(format!("{field} must be one of: {allowed} (got `{given}`)"));
    }

    if let Some(rest) = cause.strip_prefix("invalid type: ") {
        let expected = rest.split_once(", expected ").map_or(rest, |(_, e)| e);
        return Some(format!("{field} is invalid: expected {expected}"));
    }

    Some(format!("{field} is invalid: {cause}"))
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let error_msg = rejection.body_text();

                if error_msg.contains("missing field") {
                    let field = error_msg
                        .split("missing field `")
                        .nth(1)
                        .and_then(|s| s.split('`').next())
                        .unwrap_or("unknown");
                    return AppError::new(
                        StatusCode::BAD_REQUEST,
                        anyhow!("{} is required", field),
                    );
                }

                if let JsonRejection::JsonDataError(_) = rejection
                    && let Some(message) = describe_data_error(&error_msg)
                {
                    return AppError::new(StatusCode::BAD_REQUEST, anyhow!(message));
                }

                if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
                    return AppError::new(
                        StatusCode::BAD_REQUEST,
                        anyhow!("Missing 'Content-Type: application/json' header"),
                    );
                }

                AppError::new(StatusCode::BAD_REQUEST, anyhow!("Invalid request body"))
            })?;

        validate(&value)?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendly_models::attendance::AmendManyDto;
    use attendly_models::AttendanceStatus;

    #[test]
    fn test_validate_reports_field_message() {
        let dto = AmendManyDto {
            ids: Vec::new(),
            status: AttendanceStatus::Present,
            reason: None,
        };
        let err = validate(&dto).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error.to_string(), "Provide between 1 and 1000 record ids");
    }

    #[test]
    fn test_unknown_variant_names_field_and_allowed_values() {
        let text = "Failed to deserialize the JSON body into the target type: status: \
                    unknown variant `bogus`, expected one of `present`, `absent`, `late`, \
                    `excused` at line 1 column 18";
        assert_eq!(
            describe_data_error(text).unwrap(),
            "status must be one of: present, absent, late, excused (got `bogus`)"
        );
    }

    #[test]
    fn test_nested_field_and_two_choices() {
        let text = "entries[0].status: unknown variant `x`, expected `a` or `b` at line 1 column 9";
        assert_eq!(
            describe_data_error(text).unwrap(),
            "entries[0].status must be one of: a, b (got `x`)"
        );
    }

    #[test]
    fn test_invalid_type_names_field() {
        let text = "Failed to deserialize the JSON body into the target type: ids: \
                    invalid type: string \"abc\", expected a sequence at line 1 column 12";
        assert_eq!(
            describe_data_error(text).unwrap(),
            "ids is invalid: expected a sequence"
        );
    }
}
