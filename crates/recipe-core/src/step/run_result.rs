use std::fmt::Display;

/// Error opaco que pueden devolver las instrucciones de usuario.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Resultado abstracto de ejecutar las instrucciones de un step.
///
/// El éxito no transporta datos: el único output es el archivo declarado en
/// `ExecutionContext::output`, que el motor valida tras la ejecución.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRunResult {
    Success,
    Failure { reason: String },
}

impl StepRunResult {
    pub fn failure(reason: impl Display) -> Self {
        Self::Failure { reason: reason.to_string() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl<E: Display> From<Result<(), E>> for StepRunResult {
    fn from(res: Result<(), E>) -> Self {
        match res {
            Ok(()) => Self::Success,
            Err(e) => Self::failure(e),
        }
    }
}
