use crate::language::{
    errors::SyntaxError,
    lexer::{lex, Lexed},
    span::Span,
    token::{Tag, Token},
    tree::{flatten, RawNode, Tree},
};

/// A parse result. Parsing is total: unexpected input ends up wrapped in
/// `Invalid` nodes and reported through `errors`, but a tree always comes
/// back.
#[derive(Debug)]
pub struct ParsedTree {
    pub tree: Tree,
    pub ignored: Vec<Span>,
    pub errors: Vec<SyntaxError>,
}

pub fn parse(source: &str) -> ParsedTree {
    let Lexed {
        tokens,
        ignored,
        errors,
    } = lex(source);
    let parser = Parser {
        src: source,
        tokens,
        pos: 0,
        errors,
    };
    let (root, errors) = parser.run();
    ParsedTree {
        tree: flatten(root),
        ignored,
        errors,
    }
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn run(mut self) -> (RawNode, Vec<SyntaxError>) {
        let mut children = Vec::new();
        while !self.at(Tag::Eof) {
            let before = self.pos;
            self.external_declaration(&mut children);
            if self.pos == before {
                self.recover_token(&mut children);
            }
        }
        (RawNode::new(Tag::File, children, 0), self.errors)
    }

    fn current(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> Tag {
        self.current().tag
    }

    fn peek_n(&self, n: usize) -> Tag {
        self.tokens
            .get(self.pos + n)
            .map(|token| token.tag)
            .unwrap_or(Tag::Eof)
    }

    fn at(&self, tag: Tag) -> bool {
        self.peek() == tag
    }

    fn offset(&self) -> usize {
        self.current().span.start
    }

    fn bump(&mut self, out: &mut Vec<RawNode>) {
        let node = self.token_node();
        out.push(node);
    }

    fn token_node(&mut self) -> RawNode {
        let token = self.current();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        RawNode::token(token.tag, token.span)
    }

    fn expect(&mut self, tag: Tag, out: &mut Vec<RawNode>, what: &str) {
        if self.at(tag) {
            self.bump(out);
        } else {
            let span = self.current().span;
            let mut error = SyntaxError::new(
                format!("Expected {what}"),
                Span::new(span.start, span.start),
            );
            match tag {
                Tag::Semi => {
                    error = error
                        .with_help("terminate the preceding declaration or statement with `;`");
                }
                Tag::RParen | Tag::RBrace | Tag::RBracket => {
                    error = error.with_help("the matching opening delimiter is never closed");
                }
                _ => {}
            }
            self.errors.push(error);
        }
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let span = self.current().span;
        self.errors.push(SyntaxError::new(message, span));
    }

    fn recover_token(&mut self, out: &mut Vec<RawNode>) {
        let token = self.current();
        self.error_here(format!("Unexpected `{}`", token.span.text(self.src)));
        let start = token.span.start;
        let mut children = Vec::new();
        self.bump(&mut children);
        out.push(RawNode::new(Tag::Invalid, children, start));
    }

    // ---- declarations ------------------------------------------------

    fn external_declaration(&mut self, out: &mut Vec<RawNode>) {
        if self.at(Tag::Semi) {
            self.bump(out);
            return;
        }
        let start = self.offset();
        let mut children = Vec::new();
        self.type_qualifier_list(&mut children);
        match self.peek() {
            Tag::Identifier if self.peek_n(1) == Tag::LBrace => {
                out.push(self.block_declaration(children, start));
            }
            Tag::Identifier => {
                self.type_specifier(&mut children);
                if self.at(Tag::Identifier) && self.peek_n(1) == Tag::LParen {
                    out.push(self.function_declaration(children, start));
                } else {
                    if self.at(Tag::Identifier) {
                        children.push(self.variable_declaration_list());
                    }
                    self.expect(Tag::Semi, &mut children, "`;`");
                    out.push(RawNode::new(Tag::Declaration, children, start));
                }
            }
            Tag::KeywordStruct | Tag::KeywordPrecision => {
                out.push(self.declaration_tail(children, start));
            }
            _ => {
                if children.is_empty() {
                    self.recover_token(out);
                } else {
                    self.expect(Tag::Semi, &mut children, "`;`");
                    out.push(RawNode::new(Tag::Declaration, children, start));
                }
            }
        }
    }

    /// A declaration whose qualifiers are already parsed into `children`.
    fn declaration_tail(&mut self, mut children: Vec<RawNode>, start: usize) -> RawNode {
        match self.peek() {
            Tag::KeywordStruct => {
                children.push(self.struct_specifier());
                if self.at(Tag::Identifier) {
                    children.push(self.variable_declaration_list());
                }
            }
            Tag::KeywordPrecision => {
                self.bump(&mut children);
                if self.peek().is_qualifier_keyword() {
                    self.bump(&mut children);
                }
                if self.at(Tag::Identifier) {
                    self.bump(&mut children);
                }
            }
            Tag::Identifier => {
                self.type_specifier(&mut children);
                if self.at(Tag::Identifier) {
                    children.push(self.variable_declaration_list());
                }
            }
            _ => self.error_here("Expected a type specifier"),
        }
        self.expect(Tag::Semi, &mut children, "`;`");
        RawNode::new(Tag::Declaration, children, start)
    }

    fn declaration(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.type_qualifier_list(&mut children);
        self.declaration_tail(children, start)
    }

    fn function_declaration(&mut self, mut children: Vec<RawNode>, start: usize) -> RawNode {
        self.bump(&mut children);
        children.push(self.parameter_list());
        if self.at(Tag::LBrace) {
            children.push(self.block());
        } else {
            self.expect(Tag::Semi, &mut children, "`;`");
        }
        RawNode::new(Tag::FunctionDeclaration, children, start)
    }

    fn block_declaration(&mut self, mut children: Vec<RawNode>, start: usize) -> RawNode {
        self.bump(&mut children);
        children.push(self.field_declaration_list());
        if self.at(Tag::Identifier) {
            self.variable_name(&mut children);
        }
        self.expect(Tag::Semi, &mut children, "`;`");
        RawNode::new(Tag::BlockDeclaration, children, start)
    }

    fn parameter_list(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.expect(Tag::LParen, &mut children, "`(`");
        while !self.at(Tag::RParen) && !self.at(Tag::Eof) {
            if self.at(Tag::Comma) {
                self.bump(&mut children);
                continue;
            }
            let before = self.pos;
            children.push(self.parameter());
            if self.pos == before {
                self.recover_token(&mut children);
            }
        }
        self.expect(Tag::RParen, &mut children, "`)`");
        RawNode::new(Tag::ParameterList, children, start)
    }

    fn parameter(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.type_qualifier_list(&mut children);
        if self.at(Tag::KeywordStruct) {
            children.push(self.struct_specifier());
        } else if self.at(Tag::Identifier) {
            self.type_specifier(&mut children);
        } else {
            self.error_here("Expected a parameter type");
        }
        if self.at(Tag::Identifier) {
            self.variable_name(&mut children);
        }
        RawNode::new(Tag::Parameter, children, start)
    }

    fn struct_specifier(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.expect(Tag::KeywordStruct, &mut children, "`struct`");
        if self.at(Tag::Identifier) {
            self.bump(&mut children);
        }
        if self.at(Tag::LBrace) {
            children.push(self.field_declaration_list());
        }
        RawNode::new(Tag::StructSpecifier, children, start)
    }

    fn field_declaration_list(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.expect(Tag::LBrace, &mut children, "`{`");
        while !self.at(Tag::RBrace) && !self.at(Tag::Eof) {
            if self.at(Tag::Semi) {
                self.bump(&mut children);
                continue;
            }
            let before = self.pos;
            children.push(self.declaration());
            if self.pos == before {
                self.recover_token(&mut children);
            }
        }
        self.expect(Tag::RBrace, &mut children, "`}`");
        RawNode::new(Tag::FieldDeclarationList, children, start)
    }

    fn type_qualifier_list(&mut self, out: &mut Vec<RawNode>) {
        let start = self.offset();
        let mut qualifiers = Vec::new();
        loop {
            if self.at(Tag::KeywordLayout) {
                qualifiers.push(self.layout_qualifier());
            } else if self.peek().is_qualifier_keyword() {
                self.bump(&mut qualifiers);
            } else {
                break;
            }
        }
        if !qualifiers.is_empty() {
            out.push(RawNode::new(Tag::TypeQualifierList, qualifiers, start));
        }
    }

    fn layout_qualifier(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.expect(Tag::KeywordLayout, &mut children, "`layout`");
        let list_start = self.offset();
        let mut list = Vec::new();
        self.expect(Tag::LParen, &mut list, "`(`");
        while !self.at(Tag::RParen) && !self.at(Tag::Eof) {
            if self.at(Tag::Comma) {
                self.bump(&mut list);
                continue;
            }
            let before = self.pos;
            list.push(self.expression());
            if self.pos == before {
                self.recover_token(&mut list);
            }
        }
        self.expect(Tag::RParen, &mut list, "`)`");
        children.push(RawNode::new(Tag::LayoutQualifiersList, list, list_start));
        RawNode::new(Tag::LayoutQualifier, children, start)
    }

    /// `identifier` or `identifier[..]..` as a type specifier.
    fn type_specifier(&mut self, out: &mut Vec<RawNode>) {
        if !self.at(Tag::Identifier) {
            self.error_here("Expected a type specifier");
            return;
        }
        let start = self.offset();
        let mut inner = Vec::new();
        self.bump(&mut inner);
        if self.at(Tag::LBracket) {
            while self.at(Tag::LBracket) {
                inner.push(self.array());
            }
            out.push(RawNode::new(Tag::ArraySpecifier, inner, start));
        } else {
            out.append(&mut inner);
        }
    }

    /// The declared name: an identifier, possibly carrying array suffixes.
    fn variable_name(&mut self, out: &mut Vec<RawNode>) {
        if !self.at(Tag::Identifier) {
            self.error_here("Expected a name");
            return;
        }
        let start = self.offset();
        let mut inner = Vec::new();
        self.bump(&mut inner);
        if self.at(Tag::LBracket) {
            while self.at(Tag::LBracket) {
                inner.push(self.array());
            }
            out.push(RawNode::new(Tag::ArraySpecifier, inner, start));
        } else {
            out.append(&mut inner);
        }
    }

    fn array(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.expect(Tag::LBracket, &mut children, "`[`");
        if !self.at(Tag::RBracket) && !self.at(Tag::Eof) {
            children.push(self.expression());
        }
        self.expect(Tag::RBracket, &mut children, "`]`");
        RawNode::new(Tag::Array, children, start)
    }

    fn variable_declaration_list(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        loop {
            children.push(self.variable_declaration());
            if self.at(Tag::Comma) {
                self.bump(&mut children);
                continue;
            }
            break;
        }
        RawNode::new(Tag::VariableDeclarationList, children, start)
    }

    fn variable_declaration(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.variable_name(&mut children);
        if self.at(Tag::Eq) {
            self.bump(&mut children);
            children.push(self.initializer());
        }
        RawNode::new(Tag::VariableDeclaration, children, start)
    }

    fn initializer(&mut self) -> RawNode {
        if self.at(Tag::LBrace) {
            self.initializer_list()
        } else {
            self.expression()
        }
    }

    fn initializer_list(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.expect(Tag::LBrace, &mut children, "`{`");
        while !self.at(Tag::RBrace) && !self.at(Tag::Eof) {
            if self.at(Tag::Comma) {
                self.bump(&mut children);
                continue;
            }
            let before = self.pos;
            children.push(self.initializer());
            if self.pos == before {
                self.recover_token(&mut children);
            }
        }
        self.expect(Tag::RBrace, &mut children, "`}`");
        RawNode::new(Tag::InitializerList, children, start)
    }

    // ---- statements --------------------------------------------------

    fn block(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.expect(Tag::LBrace, &mut children, "`{`");
        while !self.at(Tag::RBrace) && !self.at(Tag::Eof) {
            let before = self.pos;
            self.statement(&mut children);
            if self.pos == before {
                self.recover_token(&mut children);
            }
        }
        self.expect(Tag::RBrace, &mut children, "`}`");
        RawNode::new(Tag::Block, children, start)
    }

    fn statement(&mut self, out: &mut Vec<RawNode>) {
        match self.peek() {
            Tag::LBrace => out.push(self.block()),
            Tag::Semi => self.bump(out),
            Tag::KeywordIf => out.push(self.if_statement()),
            Tag::KeywordFor => out.push(self.for_statement()),
            Tag::KeywordWhile => out.push(self.while_statement()),
            Tag::KeywordDo => out.push(self.do_statement()),
            Tag::KeywordSwitch => out.push(self.switch_statement()),
            Tag::KeywordCase | Tag::KeywordDefault => out.push(self.label_statement()),
            Tag::KeywordReturn | Tag::KeywordBreak | Tag::KeywordContinue | Tag::KeywordDiscard => {
                out.push(self.jump_statement());
            }
            _ if self.looks_like_declaration() => out.push(self.declaration()),
            _ => {
                out.push(self.expression_sequence());
                self.expect(Tag::Semi, out, "`;`");
            }
        }
    }

    fn looks_like_declaration(&self) -> bool {
        match self.peek() {
            tag if tag.is_qualifier_keyword() => true,
            Tag::KeywordLayout | Tag::KeywordStruct | Tag::KeywordPrecision => true,
            Tag::Identifier => match self.peek_n(1) {
                Tag::Identifier => true,
                Tag::LBracket => self.bracketed_type_lookahead(),
                _ => false,
            },
            _ => false,
        }
    }

    /// Distinguishes `float[2] xs;` from the indexing expression `xs[2];`.
    fn bracketed_type_lookahead(&self) -> bool {
        let mut index = self.pos + 1;
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(index) {
            match token.tag {
                Tag::LBracket => depth += 1,
                Tag::RBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self
                            .tokens
                            .get(index + 1)
                            .is_some_and(|next| next.tag == Tag::Identifier);
                    }
                }
                Tag::Semi | Tag::Eof => return false,
                _ => {}
            }
            index += 1;
        }
        false
    }

    fn condition_list(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.expect(Tag::LParen, &mut children, "`(`");
        if !self.at(Tag::RParen) && !self.at(Tag::Eof) {
            children.push(self.expression_sequence());
        }
        self.expect(Tag::RParen, &mut children, "`)`");
        RawNode::new(Tag::ConditionList, children, start)
    }

    fn if_statement(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.bump(&mut children);
        children.push(self.condition_list());
        self.statement(&mut children);
        if self.at(Tag::KeywordElse) {
            self.bump(&mut children);
            self.statement(&mut children);
        }
        RawNode::new(Tag::Statement, children, start)
    }

    fn while_statement(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.bump(&mut children);
        children.push(self.condition_list());
        self.statement(&mut children);
        RawNode::new(Tag::Statement, children, start)
    }

    fn do_statement(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.bump(&mut children);
        self.statement(&mut children);
        self.expect(Tag::KeywordWhile, &mut children, "`while`");
        children.push(self.condition_list());
        self.expect(Tag::Semi, &mut children, "`;`");
        RawNode::new(Tag::Statement, children, start)
    }

    fn switch_statement(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.bump(&mut children);
        children.push(self.condition_list());
        if self.at(Tag::LBrace) {
            children.push(self.block());
        }
        RawNode::new(Tag::Statement, children, start)
    }

    fn label_statement(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        let is_case = self.at(Tag::KeywordCase);
        self.bump(&mut children);
        if is_case {
            children.push(self.expression());
        }
        self.expect(Tag::Colon, &mut children, "`:`");
        RawNode::new(Tag::Statement, children, start)
    }

    fn jump_statement(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        let is_return = self.at(Tag::KeywordReturn);
        self.bump(&mut children);
        if is_return && !self.at(Tag::Semi) && !self.at(Tag::Eof) {
            children.push(self.expression_sequence());
        }
        self.expect(Tag::Semi, &mut children, "`;`");
        RawNode::new(Tag::Statement, children, start)
    }

    /// The `for` header keeps its init declaration inside the condition
    /// list, which is what makes the loop variable visible to the body.
    fn for_statement(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.bump(&mut children);
        let list_start = self.offset();
        let mut list = Vec::new();
        self.expect(Tag::LParen, &mut list, "`(`");
        if self.at(Tag::Semi) {
            self.bump(&mut list);
        } else if self.looks_like_declaration() {
            list.push(self.declaration());
        } else {
            list.push(self.expression_sequence());
            self.expect(Tag::Semi, &mut list, "`;`");
        }
        if !self.at(Tag::Semi) && !self.at(Tag::RParen) && !self.at(Tag::Eof) {
            list.push(self.expression_sequence());
        }
        self.expect(Tag::Semi, &mut list, "`;`");
        if !self.at(Tag::RParen) && !self.at(Tag::Eof) {
            list.push(self.expression_sequence());
        }
        self.expect(Tag::RParen, &mut list, "`)`");
        children.push(RawNode::new(Tag::ConditionList, list, list_start));
        self.statement(&mut children);
        RawNode::new(Tag::Statement, children, start)
    }

    // ---- expressions -------------------------------------------------

    fn expression_sequence(&mut self) -> RawNode {
        let start = self.offset();
        let first = self.expression();
        if !self.at(Tag::Comma) {
            return first;
        }
        let mut children = vec![first];
        while self.at(Tag::Comma) {
            self.bump(&mut children);
            children.push(self.expression());
        }
        RawNode::new(Tag::ExpressionSequence, children, start)
    }

    fn expression(&mut self) -> RawNode {
        let lhs = self.conditional();
        if self.peek().is_assignment_operator() {
            let start = lhs.span.start;
            let mut children = vec![lhs];
            self.bump(&mut children);
            children.push(self.expression());
            return RawNode::new(Tag::Assignment, children, start);
        }
        lhs
    }

    fn conditional(&mut self) -> RawNode {
        let cond = self.binary(0);
        if !self.at(Tag::Question) {
            return cond;
        }
        let start = cond.span.start;
        let mut children = vec![cond];
        self.bump(&mut children);
        children.push(self.expression());
        self.expect(Tag::Colon, &mut children, "`:`");
        children.push(self.expression());
        RawNode::new(Tag::Conditional, children, start)
    }

    fn binary(&mut self, min_precedence: u8) -> RawNode {
        let mut lhs = self.unary();
        while let Some(precedence) = infix_precedence(self.peek()) {
            if precedence < min_precedence {
                break;
            }
            let start = lhs.span.start;
            let mut children = vec![lhs];
            self.bump(&mut children);
            children.push(self.binary(precedence + 1));
            lhs = RawNode::new(Tag::Infix, children, start);
        }
        lhs
    }

    fn unary(&mut self) -> RawNode {
        if self.peek().is_prefix_operator() {
            let start = self.offset();
            let mut children = Vec::new();
            self.bump(&mut children);
            children.push(self.unary());
            return RawNode::new(Tag::Prefix, children, start);
        }
        self.postfix()
    }

    fn postfix(&mut self) -> RawNode {
        let mut expr = self.primary();
        loop {
            match self.peek() {
                Tag::Dot => {
                    let start = expr.span.start;
                    let mut children = vec![expr];
                    self.bump(&mut children);
                    if self.at(Tag::Identifier) {
                        self.bump(&mut children);
                    } else {
                        self.error_here("Expected a field name");
                    }
                    expr = RawNode::new(Tag::Selection, children, start);
                }
                Tag::LBracket => {
                    let start = expr.span.start;
                    let mut children = vec![expr];
                    while self.at(Tag::LBracket) {
                        children.push(self.array());
                    }
                    expr = RawNode::new(Tag::ArraySpecifier, children, start);
                }
                Tag::LParen => {
                    let start = expr.span.start;
                    let children = vec![expr, self.arguments_list()];
                    expr = RawNode::new(Tag::Call, children, start);
                }
                Tag::PlusPlus | Tag::MinusMinus => {
                    let start = expr.span.start;
                    let mut children = vec![expr];
                    self.bump(&mut children);
                    expr = RawNode::new(Tag::Postfix, children, start);
                }
                _ => break,
            }
        }
        expr
    }

    fn arguments_list(&mut self) -> RawNode {
        let start = self.offset();
        let mut children = Vec::new();
        self.expect(Tag::LParen, &mut children, "`(`");
        while !self.at(Tag::RParen) && !self.at(Tag::Eof) {
            if self.at(Tag::Comma) {
                self.bump(&mut children);
                continue;
            }
            let before = self.pos;
            let argument_start = self.offset();
            let expression = self.expression();
            children.push(RawNode::new(
                Tag::Argument,
                vec![expression],
                argument_start,
            ));
            if self.pos == before {
                self.recover_token(&mut children);
            }
        }
        self.expect(Tag::RParen, &mut children, "`)`");
        RawNode::new(Tag::ArgumentsList, children, start)
    }

    fn primary(&mut self) -> RawNode {
        let start = self.offset();
        match self.peek() {
            Tag::Identifier | Tag::Number | Tag::KeywordTrue | Tag::KeywordFalse => {
                self.token_node()
            }
            Tag::LParen => {
                let mut children = Vec::new();
                self.bump(&mut children);
                children.push(self.expression_sequence());
                self.expect(Tag::RParen, &mut children, "`)`");
                RawNode::new(Tag::Parenthized, children, start)
            }
            _ => {
                self.error_here("Expected an expression");
                RawNode::new(Tag::Invalid, Vec::new(), start)
            }
        }
    }
}

fn infix_precedence(tag: Tag) -> Option<u8> {
    Some(match tag {
        Tag::PipePipe => 1,
        Tag::CaretCaret => 2,
        Tag::AmpAmp => 3,
        Tag::Pipe => 4,
        Tag::Caret => 5,
        Tag::Amp => 6,
        Tag::EqEq | Tag::BangEq => 7,
        Tag::Lt | Tag::Gt | Tag::LtEq | Tag::GtEq => 8,
        Tag::Shl | Tag::Shr => 9,
        Tag::Plus | Tag::Minus => 10,
        Tag::Star | Tag::Slash | Tag::Percent => 11,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::tree::NodeId;

    fn tags_under(tree: &Tree, node: NodeId) -> Vec<Tag> {
        tree.children(node).map(|child| tree.tag(child)).collect()
    }

    fn first_with_tag(tree: &Tree, tag: Tag) -> Option<NodeId> {
        tree.node_ids().find(|&node| tree.tag(node) == tag)
    }

    #[test]
    fn parses_function_declaration_shape() {
        let parsed = parse("void main() { }");
        let tree = &parsed.tree;
        assert!(parsed.errors.is_empty());
        let function = first_with_tag(tree, Tag::FunctionDeclaration).expect("function");
        assert_eq!(
            tags_under(tree, function),
            vec![Tag::Identifier, Tag::Identifier, Tag::ParameterList, Tag::Block]
        );
    }

    #[test]
    fn parses_qualified_global_declaration() {
        let parsed = parse("layout(location = 1) uniform vec4 color;");
        let tree = &parsed.tree;
        assert!(parsed.errors.is_empty());
        let declaration = first_with_tag(tree, Tag::Declaration).expect("declaration");
        assert_eq!(
            tags_under(tree, declaration),
            vec![
                Tag::TypeQualifierList,
                Tag::Identifier,
                Tag::VariableDeclarationList,
                Tag::Semi
            ]
        );
        let qualifiers = first_with_tag(tree, Tag::TypeQualifierList).expect("qualifiers");
        assert_eq!(
            tags_under(tree, qualifiers),
            vec![Tag::LayoutQualifier, Tag::KeywordUniform]
        );
    }

    #[test]
    fn parses_interface_block_with_instance_name() {
        let parsed = parse("uniform MyBlock { vec4 color; } my_block;");
        let tree = &parsed.tree;
        assert!(parsed.errors.is_empty());
        let block = first_with_tag(tree, Tag::BlockDeclaration).expect("block declaration");
        assert_eq!(
            tags_under(tree, block),
            vec![
                Tag::TypeQualifierList,
                Tag::Identifier,
                Tag::FieldDeclarationList,
                Tag::Identifier,
                Tag::Semi
            ]
        );
    }

    #[test]
    fn for_init_declaration_lives_in_the_condition_list() {
        let parsed = parse("void main() { for (int i = 0; i < 10; i++) { i += 1; } }");
        let tree = &parsed.tree;
        assert!(parsed.errors.is_empty());
        let statement = first_with_tag(tree, Tag::Statement).expect("for statement");
        assert_eq!(
            tags_under(tree, statement),
            vec![Tag::KeywordFor, Tag::ConditionList, Tag::Block]
        );
        let condition = first_with_tag(tree, Tag::ConditionList).expect("condition list");
        assert!(tags_under(tree, condition).contains(&Tag::Declaration));
    }

    #[test]
    fn declared_arrays_attach_to_the_variable_name() {
        let parsed = parse("int values[4];");
        let tree = &parsed.tree;
        let name = first_with_tag(tree, Tag::ArraySpecifier).expect("array name");
        assert_eq!(tags_under(tree, name), vec![Tag::Identifier, Tag::Array]);
        assert_eq!(tree.tag(tree.parent(name).unwrap()), Tag::VariableDeclaration);
    }

    #[test]
    fn array_typed_specifier_is_distinguished_from_indexing() {
        let parsed = parse("void main() { float[2] xs; xs[0] = 1.0; }");
        let tree = &parsed.tree;
        let declaration = first_with_tag(tree, Tag::Declaration).expect("declaration");
        let children = tags_under(tree, declaration);
        assert_eq!(children[0], Tag::ArraySpecifier);
        let assignment = first_with_tag(tree, Tag::Assignment).expect("assignment");
        assert_eq!(tags_under(tree, assignment)[0], Tag::ArraySpecifier);
    }

    #[test]
    fn missing_terminators_are_reported_with_a_hint() {
        let parsed = parse("int x = 1");
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].message.contains("Expected `;`"));
        assert!(parsed.errors[0].help.is_some());
    }

    #[test]
    fn recovers_from_garbage_between_declarations() {
        let parsed = parse("int a; $ % int b;");
        let tree = &parsed.tree;
        assert!(!parsed.errors.is_empty());
        let declarations: Vec<_> = tree
            .node_ids()
            .filter(|&node| tree.tag(node) == Tag::Declaration)
            .collect();
        assert_eq!(declarations.len(), 2);
        assert!(first_with_tag(tree, Tag::Invalid).is_some());
    }

    #[test]
    fn struct_with_instances_parses_as_declaration() {
        let parsed = parse("struct Light { vec3 position; float radius; } key, fill;");
        let tree = &parsed.tree;
        assert!(parsed.errors.is_empty());
        let declaration = first_with_tag(tree, Tag::Declaration).expect("declaration");
        assert_eq!(
            tags_under(tree, declaration),
            vec![Tag::StructSpecifier, Tag::VariableDeclarationList, Tag::Semi]
        );
        let fields = first_with_tag(tree, Tag::FieldDeclarationList).expect("fields");
        let field_tags = tags_under(tree, fields);
        assert_eq!(
            field_tags.iter().filter(|&&tag| tag == Tag::Declaration).count(),
            2
        );
    }

    #[test]
    fn call_arguments_are_wrapped_individually() {
        let parsed = parse("void main() { mix(a, b, 0.5); }");
        let tree = &parsed.tree;
        let call = first_with_tag(tree, Tag::Call).expect("call");
        assert_eq!(
            tags_under(tree, call),
            vec![Tag::Identifier, Tag::ArgumentsList]
        );
        let arguments = first_with_tag(tree, Tag::ArgumentsList).expect("arguments");
        let argument_tags = tags_under(tree, arguments);
        assert_eq!(
            argument_tags.iter().filter(|&&tag| tag == Tag::Argument).count(),
            3
        );
    }
}
