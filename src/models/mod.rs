// src/models/mod.rs
pub mod fitzhugh_nagumo;
pub mod gbm;
pub mod lif;
pub mod model;
pub mod ou_process;

pub use fitzhugh_nagumo::FitzHughNagumo;
pub use gbm::Gbm;
pub use lif::{Lif, LifGroup};
pub use model::DynamicalModel;
pub use ou_process::OuProcess;
