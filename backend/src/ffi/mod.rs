//! Python FFI layer (pyo3 feature)

pub mod simulation;
