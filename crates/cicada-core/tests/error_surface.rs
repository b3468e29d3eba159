use cicada_core::errors::ErrorInfo;
use cicada_core::CicadaError;

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("id", "1")
        .with_context("reason", "example")
}

#[test]
fn malformed_input_surface() {
    let err = CicadaError::MalformedInput(sample_info("I001", "bad rule string"));
    assert_eq!(err.info().code, "I001");
    assert!(err.info().context.contains_key("id"));
}

#[test]
fn malformed_graph_surface() {
    let err = CicadaError::malformed_graph("G001", "epsilon edge arity != 1");
    assert_eq!(err.info().code, "G001");
}

#[test]
fn model_contract_surface() {
    let err = CicadaError::model_contract("M001", "state size mismatch");
    assert_eq!(err.info().code, "M001");
}
