//! Engine record and payload types shared by endpoint layers.
//!
//! Records decode from engine responses (see [`Record`](crate::record::Record));
//! payloads serialize into request parameters and bodies (see
//! [`Payload`](crate::wire::Payload)).

mod process;
mod task;
mod variable;

pub use process::{ProcessCancelResult, ProcessInstance, ProcessStartRequest, ProcessStartResult};
pub use task::{CountPerCandidateGroup, FormRef, Task, TaskCompletionRequest, TaskQuery};
pub use variable::{Variable, VariableModificationRequest, VariablePayload, VariableValueInfo, ValueInfo};

crate::record! {
    /// A structured error body returned by the engine.
    ///
    /// Only bodies carrying both `type` and `message` are decoded into this.
    pub struct EngineError {
        /// The engine's exception class, e.g. `InvalidRequestException`.
        kind as "type": String,
        message: String,
        code: i64,
    }
}
