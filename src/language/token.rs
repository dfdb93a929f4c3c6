use crate::language::span::Span;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Token {
    pub tag: Tag,
    pub span: Span,
}

/// Discriminator shared by token and nonterminal nodes of the parse tree.
///
/// Nonterminals come first; everything from `Identifier` on is a token.
/// `Invalid` wraps recovery subtrees, `Unknown` marks unrecognized lexemes;
/// both are skipped when extractors match positional children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    File,
    FunctionDeclaration,
    ParameterList,
    Parameter,
    Declaration,
    VariableDeclarationList,
    VariableDeclaration,
    BlockDeclaration,
    StructSpecifier,
    FieldDeclarationList,
    Block,
    Statement,
    ArraySpecifier,
    Array,
    Call,
    ArgumentsList,
    Argument,
    InitializerList,
    TypeQualifierList,
    LayoutQualifier,
    LayoutQualifiersList,
    Assignment,
    Infix,
    Prefix,
    Postfix,
    Conditional,
    Selection,
    Parenthized,
    ExpressionSequence,
    ConditionList,
    Invalid,

    Identifier,
    Number,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Dot,
    Colon,
    Question,

    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    ShlEq,
    ShrEq,
    AmpEq,
    CaretEq,
    PipeEq,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Shl,
    Shr,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    BangEq,
    Amp,
    Caret,
    Pipe,
    AmpAmp,
    CaretCaret,
    PipePipe,
    Bang,
    Tilde,
    PlusPlus,
    MinusMinus,

    KeywordConst,
    KeywordUniform,
    KeywordAttribute,
    KeywordVarying,
    KeywordBuffer,
    KeywordShared,
    KeywordCoherent,
    KeywordVolatile,
    KeywordRestrict,
    KeywordReadonly,
    KeywordWriteonly,
    KeywordIn,
    KeywordOut,
    KeywordInout,
    KeywordPatch,
    KeywordSample,
    KeywordHighp,
    KeywordMediump,
    KeywordLowp,
    KeywordSmooth,
    KeywordFlat,
    KeywordNoperspective,
    KeywordCentroid,
    KeywordInvariant,
    KeywordPrecise,
    KeywordLayout,
    KeywordStruct,
    KeywordPrecision,

    KeywordIf,
    KeywordElse,
    KeywordFor,
    KeywordWhile,
    KeywordDo,
    KeywordSwitch,
    KeywordCase,
    KeywordDefault,
    KeywordReturn,
    KeywordBreak,
    KeywordContinue,
    KeywordDiscard,
    KeywordTrue,
    KeywordFalse,

    Unknown,
    Eof,
}

impl Tag {
    pub fn is_token(self) -> bool {
        !matches!(
            self,
            Tag::File
                | Tag::FunctionDeclaration
                | Tag::ParameterList
                | Tag::Parameter
                | Tag::Declaration
                | Tag::VariableDeclarationList
                | Tag::VariableDeclaration
                | Tag::BlockDeclaration
                | Tag::StructSpecifier
                | Tag::FieldDeclarationList
                | Tag::Block
                | Tag::Statement
                | Tag::ArraySpecifier
                | Tag::Array
                | Tag::Call
                | Tag::ArgumentsList
                | Tag::Argument
                | Tag::InitializerList
                | Tag::TypeQualifierList
                | Tag::LayoutQualifier
                | Tag::LayoutQualifiersList
                | Tag::Assignment
                | Tag::Infix
                | Tag::Prefix
                | Tag::Postfix
                | Tag::Conditional
                | Tag::Selection
                | Tag::Parenthized
                | Tag::ExpressionSequence
                | Tag::ConditionList
                | Tag::Invalid
        )
    }

    /// Storage, interpolation, precision, and memory qualifier keywords.
    /// `layout(...)` is parsed into its own `LayoutQualifier` node.
    pub fn is_qualifier_keyword(self) -> bool {
        matches!(
            self,
            Tag::KeywordConst
                | Tag::KeywordUniform
                | Tag::KeywordAttribute
                | Tag::KeywordVarying
                | Tag::KeywordBuffer
                | Tag::KeywordShared
                | Tag::KeywordCoherent
                | Tag::KeywordVolatile
                | Tag::KeywordRestrict
                | Tag::KeywordReadonly
                | Tag::KeywordWriteonly
                | Tag::KeywordIn
                | Tag::KeywordOut
                | Tag::KeywordInout
                | Tag::KeywordPatch
                | Tag::KeywordSample
                | Tag::KeywordHighp
                | Tag::KeywordMediump
                | Tag::KeywordLowp
                | Tag::KeywordSmooth
                | Tag::KeywordFlat
                | Tag::KeywordNoperspective
                | Tag::KeywordCentroid
                | Tag::KeywordInvariant
                | Tag::KeywordPrecise
        )
    }

    pub fn is_assignment_operator(self) -> bool {
        matches!(
            self,
            Tag::Eq
                | Tag::PlusEq
                | Tag::MinusEq
                | Tag::StarEq
                | Tag::SlashEq
                | Tag::PercentEq
                | Tag::ShlEq
                | Tag::ShrEq
                | Tag::AmpEq
                | Tag::CaretEq
                | Tag::PipeEq
        )
    }

    pub fn is_prefix_operator(self) -> bool {
        matches!(
            self,
            Tag::Plus | Tag::Minus | Tag::Bang | Tag::Tilde | Tag::PlusPlus | Tag::MinusMinus
        )
    }

    pub fn keyword(text: &str) -> Option<Tag> {
        Some(match text {
            "const" => Tag::KeywordConst,
            "uniform" => Tag::KeywordUniform,
            "attribute" => Tag::KeywordAttribute,
            "varying" => Tag::KeywordVarying,
            "buffer" => Tag::KeywordBuffer,
            "shared" => Tag::KeywordShared,
            "coherent" => Tag::KeywordCoherent,
            "volatile" => Tag::KeywordVolatile,
            "restrict" => Tag::KeywordRestrict,
            "readonly" => Tag::KeywordReadonly,
            "writeonly" => Tag::KeywordWriteonly,
            "in" => Tag::KeywordIn,
            "out" => Tag::KeywordOut,
            "inout" => Tag::KeywordInout,
            "patch" => Tag::KeywordPatch,
            "sample" => Tag::KeywordSample,
            "highp" => Tag::KeywordHighp,
            "mediump" => Tag::KeywordMediump,
            "lowp" => Tag::KeywordLowp,
            "smooth" => Tag::KeywordSmooth,
            "flat" => Tag::KeywordFlat,
            "noperspective" => Tag::KeywordNoperspective,
            "centroid" => Tag::KeywordCentroid,
            "invariant" => Tag::KeywordInvariant,
            "precise" => Tag::KeywordPrecise,
            "layout" => Tag::KeywordLayout,
            "struct" => Tag::KeywordStruct,
            "precision" => Tag::KeywordPrecision,
            "if" => Tag::KeywordIf,
            "else" => Tag::KeywordElse,
            "for" => Tag::KeywordFor,
            "while" => Tag::KeywordWhile,
            "do" => Tag::KeywordDo,
            "switch" => Tag::KeywordSwitch,
            "case" => Tag::KeywordCase,
            "default" => Tag::KeywordDefault,
            "return" => Tag::KeywordReturn,
            "break" => Tag::KeywordBreak,
            "continue" => Tag::KeywordContinue,
            "discard" => Tag::KeywordDiscard,
            "true" => Tag::KeywordTrue,
            "false" => Tag::KeywordFalse,
            _ => return None,
        })
    }
}
