// src/models/model.rs
use crate::equation::{Equation, State};
use crate::error::IntegratorResult;

pub trait DynamicalModel {
    /// Equation descriptor for one state variable of the model
    fn equation(&self) -> IntegratorResult<Equation>;
    fn initial_state(&self, n: usize) -> State;
}
