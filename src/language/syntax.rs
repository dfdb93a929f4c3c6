//! Typed view over the flat parse tree.
//!
//! Every grammar production is described by one of four schema shapes: a
//! token, an extractor with ordered optional slots, a delimited list, or a
//! union of alternatives. Extraction is forgiving: slots are matched
//! positionally against a node's children, recovery nodes are skipped, and a
//! missing child simply leaves its slot empty. Projections hold node indices
//! only, so accessors re-extract on demand and recursive productions cost
//! nothing until they are dereferenced.

use crate::language::{
    token::Tag,
    tree::{NodeId, Tree},
};
use std::marker::PhantomData;

pub trait Syntax: Sized {
    fn try_extract(tree: &Tree, node: NodeId) -> Option<Self>;

    fn node(&self) -> NodeId;

    /// Shallow root test used while scanning positional slots.
    fn matches(tree: &Tree, node: NodeId) -> bool {
        Self::try_extract(tree, node).is_some()
    }
}

/// Advances `cursor` over recovery nodes, then consumes the current child if
/// it matches `T`. A mismatch leaves the cursor in place so the next slot can
/// try the same child.
fn match_slot<T: Syntax>(tree: &Tree, cursor: &mut NodeId, end: NodeId) -> Option<NodeId> {
    while *cursor < end && matches!(tree.tag(*cursor), Tag::Invalid | Tag::Unknown) {
        *cursor += 1;
    }
    if *cursor < end && T::matches(tree, *cursor) {
        let found = *cursor;
        *cursor += 1;
        Some(found)
    } else {
        None
    }
}

/// Iterator over the children of a range that extract as `T`; everything
/// else (separators, recovery nodes) is skipped.
pub struct Items<'t, T> {
    tree: &'t Tree,
    range: std::ops::Range<NodeId>,
    _marker: PhantomData<T>,
}

impl<'t, T> Items<'t, T> {
    fn new(tree: &'t Tree, range: std::ops::Range<NodeId>) -> Self {
        Self {
            tree,
            range,
            _marker: PhantomData,
        }
    }

    fn empty(tree: &'t Tree) -> Self {
        Self::new(tree, 0..0)
    }
}

impl<T: Syntax> Iterator for Items<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.range.start < self.range.end {
            let node = self.range.start;
            self.range.start += 1;
            if let Some(item) = T::try_extract(self.tree, node) {
                return Some(item);
            }
        }
        None
    }
}

macro_rules! token {
    ($(#[$meta:meta])* $name:ident => $tag:path) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name {
            node: NodeId,
        }

        impl Syntax for $name {
            fn try_extract(tree: &Tree, node: NodeId) -> Option<Self> {
                (tree.tag(node) == $tag).then_some(Self { node })
            }

            fn node(&self) -> NodeId {
                self.node
            }

            fn matches(tree: &Tree, node: NodeId) -> bool {
                tree.tag(node) == $tag
            }
        }

        impl $name {
            pub fn text<'s>(&self, source: &'s str, tree: &Tree) -> &'s str {
                tree.text_of(self.node, source)
            }
        }
    };
}

macro_rules! wrapper {
    ($(#[$meta:meta])* $name:ident => $tag:path) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name {
            node: NodeId,
        }

        impl Syntax for $name {
            fn try_extract(tree: &Tree, node: NodeId) -> Option<Self> {
                (tree.tag(node) == $tag).then_some(Self { node })
            }

            fn node(&self) -> NodeId {
                self.node
            }

            fn matches(tree: &Tree, node: NodeId) -> bool {
                tree.tag(node) == $tag
            }
        }
    };
}

macro_rules! extractor {
    ($(#[$meta:meta])* $name:ident($tag:path) {
        $($field:ident: $fty:ty),* $(,)?
    }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name {
            node: NodeId,
            $($field: Option<NodeId>,)*
        }

        impl Syntax for $name {
            fn try_extract(tree: &Tree, node: NodeId) -> Option<Self> {
                if tree.tag(node) != $tag {
                    return None;
                }
                let range = tree.children(node);
                let mut cursor = range.start;
                $(let $field = match_slot::<$fty>(tree, &mut cursor, range.end);)*
                let _ = cursor;
                Some(Self { node, $($field,)* })
            }

            fn node(&self) -> NodeId {
                self.node
            }

            fn matches(tree: &Tree, node: NodeId) -> bool {
                tree.tag(node) == $tag
            }
        }

        impl $name {
            $(
                pub fn $field(&self, tree: &Tree) -> Option<$fty> {
                    self.$field
                        .and_then(|child| <$fty as Syntax>::try_extract(tree, child))
                }
            )*
        }
    };
}

macro_rules! list {
    ($(#[$meta:meta])* $name:ident($tag:path) {
        prefix: $prefix:ty, item: $item:ty, suffix: $suffix:ty $(,)?
    }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name {
            node: NodeId,
        }

        impl Syntax for $name {
            fn try_extract(tree: &Tree, node: NodeId) -> Option<Self> {
                (tree.tag(node) == $tag).then_some(Self { node })
            }

            fn node(&self) -> NodeId {
                self.node
            }

            fn matches(tree: &Tree, node: NodeId) -> bool {
                tree.tag(node) == $tag
            }
        }

        impl $name {
            pub fn prefix(&self, tree: &Tree) -> Option<$prefix> {
                let range = tree.children(self.node);
                if range.is_empty() {
                    return None;
                }
                <$prefix as Syntax>::try_extract(tree, range.start)
            }

            pub fn suffix(&self, tree: &Tree) -> Option<$suffix> {
                let range = tree.children(self.node);
                if range.is_empty() {
                    return None;
                }
                <$suffix as Syntax>::try_extract(tree, range.end - 1)
            }

            pub fn iter<'t>(&self, tree: &'t Tree) -> Items<'t, $item> {
                let range = tree.children(self.node);
                let mut start = range.start;
                let mut end = range.end;
                if start < end && <$prefix as Syntax>::matches(tree, start) {
                    start += 1;
                }
                if start < end && <$suffix as Syntax>::matches(tree, end - 1) {
                    end -= 1;
                }
                Items::new(tree, start..end)
            }
        }
    };
    ($(#[$meta:meta])* $name:ident($tag:path) { item: $item:ty $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name {
            node: NodeId,
        }

        impl Syntax for $name {
            fn try_extract(tree: &Tree, node: NodeId) -> Option<Self> {
                (tree.tag(node) == $tag).then_some(Self { node })
            }

            fn node(&self) -> NodeId {
                self.node
            }

            fn matches(tree: &Tree, node: NodeId) -> bool {
                tree.tag(node) == $tag
            }
        }

        impl $name {
            pub fn iter<'t>(&self, tree: &'t Tree) -> Items<'t, $item> {
                Items::new(tree, tree.children(self.node))
            }
        }
    };
}

macro_rules! union_of {
    ($(#[$meta:meta])* $name:ident {
        $($variant:ident($vty:ty)),* $(,)?
    }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub enum $name {
            $($variant($vty),)*
        }

        impl Syntax for $name {
            fn try_extract(tree: &Tree, node: NodeId) -> Option<Self> {
                $(
                    if let Some(inner) = <$vty as Syntax>::try_extract(tree, node) {
                        return Some(Self::$variant(inner));
                    }
                )*
                None
            }

            fn node(&self) -> NodeId {
                match self {
                    $(Self::$variant(inner) => inner.node(),)*
                }
            }

            fn matches(tree: &Tree, node: NodeId) -> bool {
                $(<$vty as Syntax>::matches(tree, node) ||)* false
            }
        }
    };
}

// ---- tokens ----------------------------------------------------------

token!(Identifier => Tag::Identifier);
token!(Number => Tag::Number);
token!(LeftParen => Tag::LParen);
token!(RightParen => Tag::RParen);
token!(LeftBrace => Tag::LBrace);
token!(RightBrace => Tag::RBrace);
token!(LeftBracket => Tag::LBracket);
token!(RightBracket => Tag::RBracket);
token!(Semicolon => Tag::Semi);
token!(EqualsSign => Tag::Eq);
token!(StructKeyword => Tag::KeywordStruct);

// ---- names and specifiers --------------------------------------------

/// `name[expr]..` — an identifier-or-expression prefix carrying `array`
/// suffix nodes. Serves declared names, array-typed specifiers, and index
/// expressions alike.
#[derive(Clone, Copy, Debug)]
pub struct ArraySpecifier {
    node: NodeId,
}

impl Syntax for ArraySpecifier {
    fn try_extract(tree: &Tree, node: NodeId) -> Option<Self> {
        (tree.tag(node) == Tag::ArraySpecifier).then_some(Self { node })
    }

    fn node(&self) -> NodeId {
        self.node
    }

    fn matches(tree: &Tree, node: NodeId) -> bool {
        tree.tag(node) == Tag::ArraySpecifier
    }
}

impl ArraySpecifier {
    pub fn prefix(&self, tree: &Tree) -> Option<Identifier> {
        let range = tree.children(self.node);
        if range.is_empty() {
            return None;
        }
        Identifier::try_extract(tree, range.start)
    }

    pub fn arrays<'t>(&self, tree: &'t Tree) -> Items<'t, Array> {
        Items::new(tree, tree.children(self.node))
    }
}

extractor! {
    /// One `[..]` suffix; the expression is absent for unsized arrays.
    Array(Tag::Array) {
        open: LeftBracket,
        expression: Expression,
        close: RightBracket,
    }
}

union_of! {
    /// A declared name: a plain identifier, or one carrying array suffixes.
    VariableName {
        Identifier(Identifier),
        Array(ArraySpecifier),
    }
}

impl VariableName {
    pub fn identifier(&self, tree: &Tree) -> Option<Identifier> {
        match self {
            Self::Identifier(identifier) => Some(*identifier),
            Self::Array(array) => array.prefix(tree),
        }
    }

    pub fn arrays<'t>(&self, tree: &'t Tree) -> Items<'t, Array> {
        match self {
            Self::Identifier(_) => Items::empty(tree),
            Self::Array(array) => array.arrays(tree),
        }
    }
}

wrapper!(TypeQualifierList => Tag::TypeQualifierList);

union_of! {
    TypeSpecifier {
        Identifier(Identifier),
        Array(ArraySpecifier),
        Struct(StructSpecifier),
    }
}

// ---- declarations ----------------------------------------------------

extractor! {
    StructSpecifier(Tag::StructSpecifier) {
        keyword: StructKeyword,
        name: Identifier,
        fields: FieldDeclarationList,
    }
}

list! {
    FieldDeclarationList(Tag::FieldDeclarationList) {
        prefix: LeftBrace, item: Declaration, suffix: RightBrace,
    }
}

extractor! {
    Declaration(Tag::Declaration) {
        qualifiers: TypeQualifierList,
        specifier: TypeSpecifier,
        variables: VariableDeclarationList,
        semi: Semicolon,
    }
}

list! {
    VariableDeclarationList(Tag::VariableDeclarationList) { item: VariableDeclaration }
}

extractor! {
    VariableDeclaration(Tag::VariableDeclaration) {
        name: VariableName,
        eq: EqualsSign,
        initializer: Initializer,
    }
}

union_of! {
    Initializer {
        List(InitializerList),
        Expression(Expression),
    }
}

list! {
    InitializerList(Tag::InitializerList) {
        prefix: LeftBrace, item: Initializer, suffix: RightBrace,
    }
}

extractor! {
    FunctionDeclaration(Tag::FunctionDeclaration) {
        qualifiers: TypeQualifierList,
        specifier: TypeSpecifier,
        name: Identifier,
        parameters: ParameterList,
        block: Block,
        semi: Semicolon,
    }
}

list! {
    ParameterList(Tag::ParameterList) {
        prefix: LeftParen, item: Parameter, suffix: RightParen,
    }
}

extractor! {
    Parameter(Tag::Parameter) {
        qualifiers: TypeQualifierList,
        specifier: TypeSpecifier,
        name: VariableName,
    }
}

extractor! {
    /// An interface block: `uniform Name { .. } instance;`.
    BlockDeclaration(Tag::BlockDeclaration) {
        qualifiers: TypeQualifierList,
        specifier: Identifier,
        fields: FieldDeclarationList,
        variable: VariableName,
        semi: Semicolon,
    }
}

wrapper!(Block => Tag::Block);

union_of! {
    ExternalDeclaration {
        Function(FunctionDeclaration),
        Declaration(Declaration),
        Block(BlockDeclaration),
    }
}

list! {
    File(Tag::File) { item: ExternalDeclaration }
}

union_of! {
    /// Everything a reference's `parent_declaration` may point at.
    AnyDeclaration {
        Function(FunctionDeclaration),
        Declaration(Declaration),
        Block(BlockDeclaration),
        Parameter(Parameter),
        Struct(StructSpecifier),
    }
}

// ---- expressions -----------------------------------------------------

extractor! {
    Call(Tag::Call) {
        name: Identifier,
        arguments: ArgumentsList,
    }
}

list! {
    ArgumentsList(Tag::ArgumentsList) {
        prefix: LeftParen, item: Argument, suffix: RightParen,
    }
}

extractor! {
    Argument(Tag::Argument) {
        expression: Expression,
    }
}

extractor! {
    Parenthized(Tag::Parenthized) {
        open: LeftParen,
        expression: Expression,
        close: RightParen,
    }
}

wrapper!(Assignment => Tag::Assignment);
wrapper!(Infix => Tag::Infix);
wrapper!(Prefix => Tag::Prefix);
wrapper!(Postfix => Tag::Postfix);
wrapper!(Conditional => Tag::Conditional);
wrapper!(Selection => Tag::Selection);
wrapper!(ExpressionSequence => Tag::ExpressionSequence);

union_of! {
    Expression {
        Identifier(Identifier),
        Number(Number),
        Call(Call),
        Selection(Selection),
        Array(ArraySpecifier),
        Parenthized(Parenthized),
        Prefix(Prefix),
        Postfix(Postfix),
        Infix(Infix),
        Conditional(Conditional),
        Assignment(Assignment),
        Sequence(ExpressionSequence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parser::parse;
    use crate::language::span::Span;
    use crate::language::tree::{flatten, RawNode};

    fn first_node(tree: &Tree, tag: Tag) -> NodeId {
        tree.node_ids()
            .find(|&node| tree.tag(node) == tag)
            .expect("node with tag")
    }

    #[test]
    fn extracts_function_declaration_slots() {
        let source = "void main() {}";
        let parsed = parse(source);
        let tree = &parsed.tree;
        let node = first_node(tree, Tag::FunctionDeclaration);
        let function = FunctionDeclaration::try_extract(tree, node).expect("extract");
        assert_eq!(function.node(), node);
        let name = function.name(tree).expect("name");
        assert_eq!(name.text(source, tree), "main");
        let specifier = function.specifier(tree).expect("specifier");
        assert!(matches!(specifier, TypeSpecifier::Identifier(_)));
        assert!(function.qualifiers(tree).is_none());
        assert!(function.parameters(tree).is_some());
        assert!(function.block(tree).is_some());
        assert!(function.semi(tree).is_none());
    }

    #[test]
    fn missing_children_leave_slots_unset_without_derailing_later_ones() {
        let source = "int x = 1";
        let parsed = parse(source);
        let tree = &parsed.tree;
        let node = first_node(tree, Tag::Declaration);
        let declaration = Declaration::try_extract(tree, node).expect("extract");
        assert!(declaration.qualifiers(tree).is_none());
        assert!(declaration.specifier(tree).is_some());
        assert!(declaration.variables(tree).is_some());
        assert!(declaration.semi(tree).is_none());
        let variable = declaration
            .variables(tree)
            .expect("list")
            .iter(tree)
            .next()
            .expect("one variable");
        assert!(variable.eq(tree).is_some());
        assert!(matches!(
            variable.initializer(tree),
            Some(Initializer::Expression(Expression::Number(_)))
        ));
    }

    #[test]
    fn recovery_children_are_skipped_during_the_slot_scan() {
        let name = RawNode::token(Tag::Identifier, Span::new(0, 1));
        let declaration = RawNode::new(
            Tag::VariableDeclaration,
            vec![
                RawNode::new(Tag::Invalid, Vec::new(), 0),
                name,
                RawNode::token(Tag::Eq, Span::new(2, 3)),
            ],
            0,
        );
        let tree = flatten(RawNode::new(Tag::File, vec![declaration], 0));
        let node = first_node(&tree, Tag::VariableDeclaration);
        let variable = VariableDeclaration::try_extract(&tree, node).expect("extract");
        assert!(variable.name(&tree).is_some());
        assert!(variable.eq(&tree).is_some());
        assert!(variable.initializer(&tree).is_none());
    }

    #[test]
    fn variable_name_exposes_identifier_and_array_suffixes() {
        let source = "int values[4][2];";
        let parsed = parse(source);
        let tree = &parsed.tree;
        let node = first_node(tree, Tag::ArraySpecifier);
        let name = VariableName::try_extract(tree, node).expect("extract");
        let identifier = name.identifier(tree).expect("identifier");
        assert_eq!(identifier.text(source, tree), "values");
        assert_eq!(name.arrays(tree).count(), 2);
    }

    #[test]
    fn parameter_list_iterates_interior_between_delimiters() {
        let source = "int add(int x, int y);";
        let parsed = parse(source);
        let tree = &parsed.tree;
        let node = first_node(tree, Tag::ParameterList);
        let list = ParameterList::try_extract(tree, node).expect("extract");
        assert!(list.prefix(tree).is_some());
        assert!(list.suffix(tree).is_some());
        let names: Vec<_> = list
            .iter(tree)
            .filter_map(|parameter| parameter.name(tree))
            .filter_map(|name| name.identifier(tree))
            .map(|identifier| identifier.text(source, tree).to_string())
            .collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn unions_dispatch_on_the_first_matching_variant() {
        let source = "struct Light { vec3 position; } light;";
        let parsed = parse(source);
        let tree = &parsed.tree;
        let node = first_node(tree, Tag::StructSpecifier);
        assert!(matches!(
            TypeSpecifier::try_extract(tree, node),
            Some(TypeSpecifier::Struct(_))
        ));
        let declaration = first_node(tree, Tag::Declaration);
        assert!(matches!(
            AnyDeclaration::try_extract(tree, declaration),
            Some(AnyDeclaration::Declaration(_))
        ));
        assert_eq!(
            AnyDeclaration::try_extract(tree, declaration).unwrap().node(),
            declaration
        );
    }

    #[test]
    fn file_lists_external_declarations_in_order() {
        let source = "uniform vec4 color; void main() {} uniform Data { float t; } data;";
        let parsed = parse(source);
        let tree = &parsed.tree;
        let file = File::try_extract(tree, tree.root()).expect("file");
        let kinds: Vec<_> = file
            .iter(tree)
            .map(|declaration| match declaration {
                ExternalDeclaration::Declaration(_) => "declaration",
                ExternalDeclaration::Function(_) => "function",
                ExternalDeclaration::Block(_) => "block",
            })
            .collect();
        assert_eq!(kinds, vec!["declaration", "function", "block"]);
    }
}
