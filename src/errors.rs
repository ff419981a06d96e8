//! Error types shared by all stages.
//!
//! Every failure is reported at the stage boundary where the offending
//! precondition is checked. Nothing is retried and a failed stage never hands
//! partial output to the next one.

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Toml(::toml::de::Error);
    }

    errors {
        // Invalid grid or kernel parameters, mismatched degrees of freedom.
        Configuration(msg: String) {
            description("invalid configuration")
            display("configuration error: {}", msg)
        }
        // A locator, transform or pipeline stage was used after the data it
        // was derived from changed, or out of order.
        StaleState(msg: String) {
            description("stale state")
            display("stale state: {}", msg)
        }
        // Kernel support exceeds the domain.
        Domain(msg: String) {
            description("domain error")
            display("domain error: {}", msg)
        }
        // Singular wavenumber outside the zero-mode policy, incompatible
        // transform size or non-finite result.
        Numeric(msg: String) {
            description("numeric error")
            display("numeric error: {}", msg)
        }
    }
}

/// Shorthand for returning a configuration error.
pub fn configuration<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(ErrorKind::Configuration(msg.into()).into())
}

/// Shorthand for returning a stale state error.
pub fn stale<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(ErrorKind::StaleState(msg.into()).into())
}

/// Shorthand for returning a domain error.
pub fn domain<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(ErrorKind::Domain(msg.into()).into())
}

/// Shorthand for returning a numeric error.
pub fn numeric<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(ErrorKind::Numeric(msg.into()).into())
}
