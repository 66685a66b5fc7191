use nexusgate::errors::code;
use nexusgate::{DbError, OperationError, TransportError};

#[test]
fn command_error_display_carries_server_detail() {
    let err: DbError = OperationError::command(code::NAMESPACE_EXISTS, "NamespaceExists", "already exists").into();
    assert_eq!(err.to_string(), "Command failed: NamespaceExists (48): already exists");
    assert_eq!(err.code(), Some(48));
}

#[test]
fn transport_errors_convert_through_operation() {
    let err: DbError = TransportError::Io("broken pipe".into()).into();
    assert!(matches!(err, DbError::Operation(OperationError::Transport(TransportError::Io(_)))));
    assert!(err.is_transport());
    assert_eq!(err.to_string(), "Transport error: I/O error: broken pipe");
}

#[test]
fn local_errors_are_not_operation_errors() {
    let err = DbError::PreconditionViolation("moved-from".into());
    assert!(!err.is_operation());
    assert!(!err.is_transport());
    assert_eq!(err.code(), None);
}
