#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Tag marking a line that does not belong in the solution.
pub const DISTRACTOR_TAG: &str = "#distractor";

/// Tag marking a distractor that has been grouped with a correct line.
pub const PAIRED_TAG: &str = "#paired";

/// Two-character escape (backslash + `n`) joining the sub-lines of a combined
/// line inside a problem definition.
pub const BLOCK_SEPARATOR: &str = "\\n";

/// Default number of whitespace characters per indentation level.
pub const DEFAULT_INDENT_UNIT: usize = 4;

/// Colours handed out to paired groups, cycled by group index.
pub const GROUP_COLORS: [&str; 6] = ["#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4"];

/// Keywords that open a control structure when followed by whitespace or `:`.
pub const CONTROL_KEYWORDS: [&str; 11] =
    ["if", "for", "while", "def", "class", "try", "except", "finally", "with", "elif", "else"];

/// Operators that may be swapped for one another when deciding whether two
/// lines are near-duplicates.
///
/// Longer symbolic operators are listed before their prefixes so the
/// tokenizer can match greedily.
pub const OPERATORS: [&str; 28] = [
    "**=", "//=", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", "**", "//", "<", ">", "+",
    "-", "*", "/", "%", "=", "and", "or", "not", "in", "is", "not in", "is not",
];

/// Edit-distance similarity above which two lines count as related.
pub const RELATED_SIMILARITY_FLOOR: f64 = 0.7;

/// Number of incorrect attempts after which help becomes available.
pub const DEFAULT_HELP_THRESHOLD: u32 = 2;

/// Number of adjacent-line merges performed per "combine blocks" adaptation.
pub const DEFAULT_COMBINE_PER_ADAPTATION: usize = 1;

/// Combining stops once fewer solution lines than this remain.
pub const MIN_COMBINABLE_LINES: usize = 4;

/// Merged lines shorter than this (in characters) score a bonus.
pub const SHORT_LINE_LIMIT: usize = 100;

/// Upper bound on the number of generated distractors.
pub const MAX_GENERATED_DISTRACTORS: usize = 10;

/// Identifier renames used to generate wrong-variable distractors.
pub const VARIABLE_RENAMES: [(&str, [&str; 3]); 11] = [
    ("i", ["j", "k", "index"]),
    ("j", ["i", "k", "index"]),
    ("x", ["y", "val", "value"]),
    ("y", ["x", "val", "value"]),
    ("data", ["values", "items", "records"]),
    ("result", ["output", "results", "ret"]),
    ("list", ["lst", "array", "items"]),
    ("dict", ["map", "dictionary", "table"]),
    ("string", ["str", "text", "word"]),
    ("count", ["total", "sum", "counter"]),
    ("value", ["val", "item", "element"]),
];

/// Operator swaps used to generate wrong-operator distractors.
pub const OPERATOR_SWAPS: [(&str, &[&str]); 16] = [
    ("==", &["!=", ">=", "<="]),
    ("!=", &["==", ">=", "<="]),
    (">", &["<", ">=", "=="]),
    ("<", &[">", "<=", "=="]),
    (">=", &["<=", ">", "=="]),
    ("<=", &[">=", "<", "=="]),
    ("+", &["-", "*", "/"]),
    ("-", &["+", "*", "/"]),
    ("*", &["+", "-", "/"]),
    ("/", &["*", "+", "-"]),
    ("+=", &["-=", "*=", "="]),
    ("-=", &["+=", "*=", "="]),
    ("and", &["or", "not"]),
    ("or", &["and", "not"]),
    ("in", &["not in"]),
    ("not in", &["in"]),
];
