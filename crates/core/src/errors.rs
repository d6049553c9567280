use thiserror::Error;

/// Why a parsed model output could not populate a stage record.
///
/// Shape failures are values consumed by the pipeline's degrade decision,
/// never propagated to callers.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("model output contained no JSON object")]
    EmptyMapping,
    #[error("record fields missing or mistyped: {0}")]
    Deserialize(String),
    #[error("field `{field}` out of range: {value} (expected {expected})")]
    OutOfRange { field: &'static str, value: i64, expected: &'static str },
}
