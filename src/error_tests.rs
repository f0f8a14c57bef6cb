use super::*;

#[test]
fn http_status_mapping() {
    assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
    assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
    assert_eq!(AppError::conflict("conflict", "dup").http_status(), 409);
    assert_eq!(AppError::auth("auth", "no").http_status(), 401);
    assert_eq!(AppError::remote("remote", "bad gateway").http_status(), 502);
    assert_eq!(AppError::decode("invalid_json", "eof").http_status(), 422);
    assert_eq!(AppError::io("io", "io").http_status(), 503);
    assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
}

#[test]
fn backend_status_maps_to_variant() {
    assert!(matches!(AppError::from_status(404, ""), AppError::NotFound { .. }));
    assert!(matches!(AppError::from_status(403, "denied"), AppError::Auth { .. }));
    assert!(matches!(AppError::from_status(401, ""), AppError::Auth { .. }));
    assert!(matches!(AppError::from_status(409, ""), AppError::Conflict { .. }));
    assert!(matches!(AppError::from_status(500, ""), AppError::Remote { .. }));

    let e = AppError::from_status(400, "  malformed acl  ");
    assert_eq!(e.code_str(), "http_400");
    assert_eq!(e.message(), "malformed acl");
    assert_eq!(AppError::from_status(502, "").message(), "backend returned HTTP 502");
}

#[test]
fn display_joins_code_and_message() {
    let e = AppError::not_found("series_missing", "no series 42");
    assert_eq!(e.to_string(), "series_missing: no series 42");
}

#[test]
fn json_errors_become_decode_errors() {
    let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let app: AppError = err.into();
    assert_eq!(app.code_str(), "invalid_json");
    assert_eq!(app.http_status(), 422);
}
