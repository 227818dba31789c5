//! Error taxonomy for the harness.
//!
//! Every failure is surfaced synchronously to the calling test; nothing is
//! retried or recovered internally. Configuration errors abort the render
//! before the host renderer is touched, query errors abort at the point of
//! access.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShallowError>;

#[derive(Debug, Error)]
pub enum ShallowError {
    /// A bind target that is not a declared input of the unit under test.
    #[error("'{property}' is not an input of {unit}; only declared inputs may be bound")]
    NotAnInput { property: String, unit: String },

    /// Binding onto a unit that is only reachable through a dynamic outlet.
    #[error(
        "cannot bind '{property}' on {unit}: it is a dynamically-loaded (entry) component, \
         bindings cannot be wired through dynamic instantiation"
    )]
    InvalidBindOnEntryComponent { property: String, unit: String },

    /// A reference handed in as a module that carries no module metadata.
    #[error("{name} is not a recognized module reference")]
    InvalidModule { name: String },

    /// A reference that satisfies no mockable shape.
    #[error("don't know how to mock {name}")]
    NotMockable { name: String },

    /// `mock_static` was pointed at something other than a function.
    #[error("static mock target '{target}' on {name} is not a function")]
    StaticMockNotAFunction { name: String, target: String },

    /// Property access on a query that matched nothing.
    #[error("query '{query}' found no matches; check the selector or reference")]
    NoMatches { query: String },

    /// Single-result operation on a query that matched more than one node.
    #[error("query '{query}' matched {count} results where exactly one was required")]
    MultipleMatches { query: String, count: usize },

    /// Searching for the unit under test by its own selector or reference.
    #[error(
        "query '{query}' matched the unit under test itself; it is already available as \
         `instance`/`element` on the rendering, don't search for it"
    )]
    MatchedTestComponent { query: String },

    /// Output accessor pointed at a property that is not a declared output.
    #[error("'{name}' is not a declared output of {unit}")]
    NotAnOutput { name: String, unit: String },

    /// Output accessor pointed at a declared output that holds no emitter.
    #[error("output '{name}' on {unit} is not an event emitter")]
    NotAnEmitter { name: String, unit: String },

    /// No provider reached the assembled test module for the requested token.
    #[error("no provider for {token}")]
    NoProvider { token: String },

    /// Provider resolution re-entered itself.
    #[error("circular dependency while resolving {token}")]
    CircularDependency { token: String },

    #[error("template parse error: {0}")]
    TemplateParse(String),

    #[error("expression parse error: {0}")]
    ExpressionParse(String),

    #[error("selector parse error: {0}")]
    SelectorParse(String),

    /// Wrapper around any error raised while generating a mock. Carries the
    /// offending reference's name and points at the `dont_mock` escape hatch.
    #[error(
        "failed to mock {name}; if it cannot be mocked automatically, exclude it with \
         `dont_mock({name})`"
    )]
    MockGeneration {
        name: String,
        #[source]
        source: Box<ShallowError>,
    },
}
