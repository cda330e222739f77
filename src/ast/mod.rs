/// AST (Abstract Syntax Tree) module
/// Contains the node shapes the transpiler consumes from the parser
///
/// Submodules:
/// - ast: Statement nodes and program loading
/// - expressions: Operands and flat expressions
/// - statements: Payloads of the compound statement nodes
/// - types: Type tags and operators
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
