use thiserror::Error;

use crate::resolution::FactKey;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur during predicate construction,
/// symbol resolution, advice weaving, and class synthesis. Each variant provides specific context
/// about the failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Construction Errors
/// - [`Error::Predicate`] - Invalid predicate or shape pattern text
/// - [`Error::Descriptor`] - Invalid JVM type or method descriptor
///
/// ## Resolution Errors
/// - [`Error::ResolutionMiss`] - A required runtime fact has not been resolved yet
///
/// ## Weaving Errors
/// - [`Error::WeavingConflict`] - A woven method failed operand-stack verification
///
/// ## Synthesis Errors
/// - [`Error::MissingFact`] - Class synthesis requires a fact that is unresolved
///
/// ## Decoding Errors
/// - [`Error::Malformed`] - Corrupted or inconsistent class structure
///
/// # Examples
///
/// ```rust
/// use classweave::classfile::TypeDesc;
/// use classweave::Error;
///
/// match TypeDesc::parse("Q") {
///     Ok(parsed) => println!("parsed {:?}", parsed),
///     Err(Error::Descriptor { message }) => eprintln!("bad descriptor: {}", message),
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Construction Errors
    /// A predicate or shape pattern could not be constructed.
    ///
    /// This error occurs when pattern text handed to a predicate constructor is
    /// syntactically invalid, for example an unbalanced argument list or a tail
    /// wildcard that is not in trailing position. Predicates are validated once
    /// at construction so that evaluation itself can never fail.
    #[error("Invalid predicate - {message}")]
    Predicate {
        /// Detailed description of what was rejected
        message: String,
    },

    /// A JVM type or method descriptor could not be parsed.
    ///
    /// Descriptors are parsed eagerly wherever they enter the system (method
    /// references, field references, shape patterns) so that all downstream
    /// code can rely on well-formed [`crate::classfile::TypeDesc`] values.
    #[error("Invalid descriptor - {message}")]
    Descriptor {
        /// Detailed description of the malformed descriptor
        message: String,
    },

    // Resolution Errors
    /// A required runtime fact has not been resolved.
    ///
    /// Returned by the typed accessors on [`crate::resolution::ResolutionContext`]
    /// when a consumer asks for a fact that no heuristic has recorded yet. Callers
    /// that can tolerate absence should treat this as "not yet" rather than as a
    /// hard failure; the fact may appear once further classes are observed.
    #[error("Unresolved runtime fact - {0}")]
    ResolutionMiss(FactKey),

    // Weaving Errors
    /// A woven method body failed operand-stack verification.
    ///
    /// After advice is spliced into a method, the weaver simulates the operand
    /// stack over every reachable path. Any underflow, inconsistent merge depth,
    /// or ill-formed handler entry aborts the rewrite with this error so that a
    /// broken body is never handed back to the host.
    ///
    /// # Fields
    ///
    /// * `class` - Internal name of the class being woven
    /// * `method` - Name of the method that failed verification
    /// * `message` - What the verifier rejected
    #[error("Weaving conflict in {class}.{method}: {message}")]
    WeavingConflict {
        /// Internal name of the class that was being rewritten
        class: String,
        /// Name of the method that failed verification
        method: String,
        /// The verifier's rejection message
        message: String,
    },

    // Synthesis Errors
    /// Class synthesis needed a fact that is unresolved.
    ///
    /// Generators fail fast: every fact a synthesized class depends on is looked
    /// up before any code is emitted, and the first gap aborts generation. This
    /// is distinct from [`Error::ResolutionMiss`] so hosts can tell "a lookup
    /// missed" from "a whole generated class is unavailable".
    #[error("Cannot synthesize class, missing runtime fact - {0}")]
    MissingFact(FactKey),

    // Decoding Errors
    /// The class structure is damaged or inconsistent.
    ///
    /// This error indicates a decoded class that violates structural expectations,
    /// such as a branch to a label that does not exist in the method body. The
    /// error includes the source location where the malformation was detected
    /// for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}
