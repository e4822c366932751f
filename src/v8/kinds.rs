use super::StateParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of inline cache reported by `--log-ic`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IcType {
    LoadIC,
    StoreIC,
    KeyedLoadIC,
    KeyedStoreIC,
    LoadGlobalIC,
    StoreGlobalIC,
    StoreInArrayLiteralIC,
}

impl IcType {
    pub const ALL: [IcType; 7] = [
        IcType::LoadIC,
        IcType::StoreIC,
        IcType::KeyedLoadIC,
        IcType::KeyedStoreIC,
        IcType::LoadGlobalIC,
        IcType::StoreGlobalIC,
        IcType::StoreInArrayLiteralIC,
    ];

    /// Log name of the IC (e.g. "KeyedLoadIC")
    pub fn name(self) -> &'static str {
        match self {
            IcType::LoadIC => "LoadIC",
            IcType::StoreIC => "StoreIC",
            IcType::KeyedLoadIC => "KeyedLoadIC",
            IcType::KeyedStoreIC => "KeyedStoreIC",
            IcType::LoadGlobalIC => "LoadGlobalIC",
            IcType::StoreGlobalIC => "StoreGlobalIC",
            IcType::StoreInArrayLiteralIC => "StoreInArrayLiteralIC",
        }
    }

    /// Whether the IC guards a write rather than a read
    pub fn is_store(self) -> bool {
        matches!(
            self,
            IcType::StoreIC
                | IcType::KeyedStoreIC
                | IcType::StoreGlobalIC
                | IcType::StoreInArrayLiteralIC
        )
    }
}

impl fmt::Display for IcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IcType {
    type Err = StateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| StateParseError::new("IC type", s))
    }
}

/// Kind of code object attached to a code event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeKind {
    BytecodeHandler,
    ForTesting,
    Builtin,
    RegExp,
    WasmFunction,
    WasmToCapiFunction,
    WasmToJsFunction,
    JsToWasmFunction,
    JsToJsFunction,
    CWasmEntry,
    InterpretedFunction,
    Baseline,
    Maglev,
    Turbofan,
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeKind::BytecodeHandler => "Bytecode Handler",
            CodeKind::ForTesting => "For Testing",
            CodeKind::Builtin => "Builtin",
            CodeKind::RegExp => "RegExp",
            CodeKind::WasmFunction => "Wasm Function",
            CodeKind::WasmToCapiFunction => "Wasm to C-API Function",
            CodeKind::WasmToJsFunction => "Wasm to JS Function",
            CodeKind::JsToWasmFunction => "JS to Wasm Function",
            CodeKind::JsToJsFunction => "JS to JS Function",
            CodeKind::CWasmEntry => "C Wasm Entry",
            CodeKind::InterpretedFunction => "Interpreted Function",
            CodeKind::Baseline => "Baseline",
            CodeKind::Maglev => "Maglev",
            CodeKind::Turbofan => "Turbofan",
        };
        f.write_str(name)
    }
}

/// Bailout type of a deoptimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeoptimizeKind {
    Eager,
    Soft,
    Lazy,
}

impl fmt::Display for DeoptimizeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeoptimizeKind::Eager => "Eager",
            DeoptimizeKind::Soft => "Soft",
            DeoptimizeKind::Lazy => "Lazy",
        };
        f.write_str(name)
    }
}

/// Source-level kind of the symbol a function entry was resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    #[default]
    Function,
    Class,
    Namespace,
    Enum,
    Method,
    Property,
    Field,
    Constructor,
}
