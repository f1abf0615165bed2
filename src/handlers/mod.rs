// Handlers are split by security tier:
// public (no credential) and protected (verified bearer credential).
pub mod protected;
pub mod public;
