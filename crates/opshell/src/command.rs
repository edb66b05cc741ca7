pub mod evaluator;
pub mod outcome;
pub mod parser;
pub mod spec;

pub use evaluator::{evaluate, BuiltinExecute, ARGS_KEY};
pub use outcome::CommandOutcome;
pub use parser::{parse_input, tokenize, InputKind, ParsedInput, BUILTIN_COMMANDS};
pub use spec::{
    boxed_outcome, ArgSpec, CommandDescriptor, CommandExecute, CommandSpec, OptionSpec, ValueType,
};
