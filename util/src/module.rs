//! Interface of the cyclic processing modules.
//!
//! A module is set up once from its parameters with [`State::init`], then
//! driven by the control loop through [`State::proc`] on every tick.

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Internal state of a cyclic module.
pub trait State {
    /// Whatever the module is configured from, usually its `Params`.
    type InitData;
    type InitError;

    /// Per-tick inputs.
    type InputData;
    /// Per-tick outputs, handed on to the next stage of the loop.
    type OutputData;
    /// Diagnostics about the tick which don't feed the next stage.
    type StatusReport;
    type ProcError;

    /// Configure the module. Invalid `init_data` is rejected and leaves the
    /// module unconfigured.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError>;

    /// Run one tick of processing.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
