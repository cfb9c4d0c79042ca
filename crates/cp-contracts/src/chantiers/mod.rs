//! Chantier contracts

mod base;
mod create;
mod update;

pub use base::ChantierBaseContract;
pub use create::CreateChantierContract;
pub use update::UpdateChantierContract;
