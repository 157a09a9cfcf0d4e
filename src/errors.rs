//! Error taxonomy for the core pipeline: `ConfigError`, `DomainError` and
//! `InvariantViolation`. The Boris step's overflow guard is a numeric rule
//! handled inline, never surfaced as an error.

error_chain! {
    errors {
        ConfigError(msg: String) {
            description("malformed configuration")
            display("config error: {}", msg)
        }
        DomainError(msg: String) {
            description("domain error")
            display("domain error: {}", msg)
        }
        InvariantViolation(msg: String) {
            description("invariant violation")
            display("invariant violation: {}", msg)
        }
    }
}
