//! Problem instances: declarations plus required formulas.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ltlsat_logic::{free_symbols, symbols, Alphabet, Node, Sort, Symbol, SymbolKind, SymbolType};

use crate::errors::ModuleError;

/// A declared symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Object {
    symbol: Symbol,
}

impl Object {
    pub fn name(&self) -> &str {
        self.symbol.name()
    }

    pub fn ty(&self) -> &SymbolType {
        self.symbol.ty()
    }

    pub fn kind(&self) -> SymbolKind {
        self.symbol.kind()
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Whether this is a boolean variable, i.e. a proposition.
    pub fn is_proposition(&self) -> bool {
        self.symbol.sort() == Some(&Sort::Boolean)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.symbol.name(), self.symbol.ty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    declarations: usize,
    requirements: usize,
}

/// A satisfiability problem: ordered declarations and ordered requirements.
///
/// Modules are values. Cloning copies them, and every transform produces a
/// fresh module instead of mutating its input. Equality and hashing look at
/// the declaration and requirement sequences only.
#[derive(Debug, Clone)]
pub struct Module {
    sigma: Alphabet,
    declarations: Vec<Object>,
    requirements: Vec<Node>,
    frames: Vec<Frame>,
}

impl Module {
    pub fn new(sigma: &Alphabet) -> Self {
        Module {
            sigma: sigma.clone(),
            declarations: Vec::new(),
            requirements: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.sigma
    }

    pub fn declarations(&self) -> &[Object] {
        &self.declarations
    }

    pub fn requirements(&self) -> &[Node] {
        &self.requirements
    }

    pub fn lookup(&self, name: &str) -> Option<&Object> {
        self.declarations.iter().find(|o| o.name() == name)
    }

    /// Declare `name` with type `ty`.
    ///
    /// Declaring an existing name again with the same type returns the
    /// existing object.
    pub fn declare(
        &mut self,
        name: &str,
        ty: impl Into<SymbolType>,
    ) -> Result<Object, ModuleError> {
        let ty = ty.into();
        if let Some(existing) = self.check_redeclaration(name, &ty)? {
            return Ok(existing);
        }
        let symbol = self.sigma.symbol(name, ty);
        Ok(self.push_declaration(symbol))
    }

    /// Declare an already interned symbol.
    pub fn declare_symbol(&mut self, symbol: &Symbol) -> Result<Object, ModuleError> {
        if !self.sigma.owns_symbol(symbol) {
            return Err(ModuleError::ForeignAlphabet);
        }
        if let Some(existing) = self.check_redeclaration(symbol.name(), symbol.ty())? {
            return Ok(existing);
        }
        Ok(self.push_declaration(symbol.clone()))
    }

    fn check_redeclaration(
        &self,
        name: &str,
        ty: &SymbolType,
    ) -> Result<Option<Object>, ModuleError> {
        match self.lookup(name) {
            Some(existing) if existing.ty() == ty => Ok(Some(existing.clone())),
            Some(existing) => Err(ModuleError::DuplicateDeclaration {
                name: name.to_string(),
                existing: existing.ty().clone(),
                requested: ty.clone(),
            }),
            None => Ok(None),
        }
    }

    fn push_declaration(&mut self, symbol: Symbol) -> Object {
        let object = Object { symbol };
        self.declarations.push(object.clone());
        object
    }

    /// Declare a symbol named `{prefix}{n}` for the first `n` whose name is
    /// neither declared nor occurring, bound or free, in a requirement.
    pub fn fresh(&mut self, prefix: &str, ty: impl Into<SymbolType>) -> Object {
        let reserved: HashSet<Arc<str>> = self
            .requirements
            .iter()
            .flat_map(symbols)
            .map(|s| Arc::from(s.name()))
            .collect();
        self.fresh_avoiding(prefix, ty, &reserved)
    }

    /// Like [`Module::fresh`], also skipping every name in `reserved`.
    ///
    /// Requirements of this module are not consulted; callers rewriting
    /// formulas held elsewhere pass the names occurring in them.
    pub fn fresh_avoiding(
        &mut self,
        prefix: &str,
        ty: impl Into<SymbolType>,
        reserved: &HashSet<Arc<str>>,
    ) -> Object {
        let ty = ty.into();
        let name = (0..)
            .map(|n: u64| format!("{prefix}{n}"))
            .find(|name| self.lookup(name).is_none() && !reserved.contains(name.as_str()))
            .unwrap_or_else(|| prefix.to_string());
        let symbol = self.sigma.symbol(&name, ty);
        self.push_declaration(symbol)
    }

    /// Add a requirement. Every free symbol must be declared in this module.
    pub fn require(&mut self, formula: impl AsRef<Node>) -> Result<(), ModuleError> {
        let formula = formula.as_ref();
        if !self.sigma.owns(formula) {
            return Err(ModuleError::ForeignAlphabet);
        }
        if !formula.is_formula() {
            return Err(ModuleError::NotAFormula);
        }
        for symbol in free_symbols(formula) {
            if !self.declarations.iter().any(|o| o.symbol == symbol) {
                return Err(ModuleError::UnboundSymbol {
                    name: symbol.name().to_string(),
                });
            }
        }
        self.requirements.push(formula.clone());
        Ok(())
    }

    /// Append the declarations and requirements of `other`.
    pub fn import(&mut self, other: &Module) -> Result<(), ModuleError> {
        if self.sigma != other.sigma {
            return Err(ModuleError::ForeignAlphabet);
        }
        for object in &other.declarations {
            self.declare_symbol(&object.symbol)?;
        }
        for formula in &other.requirements {
            self.require(formula)?;
        }
        Ok(())
    }

    /// Open a frame; [`Module::pop`] discards what was added after it.
    pub fn push(&mut self) {
        self.frames.push(Frame {
            declarations: self.declarations.len(),
            requirements: self.requirements.len(),
        });
    }

    /// Close the `n` innermost frames.
    pub fn pop(&mut self, n: usize) -> Result<(), ModuleError> {
        if n > self.frames.len() {
            return Err(ModuleError::PopUnderflow {
                requested: n,
                available: self.frames.len(),
            });
        }
        if n == 0 {
            return Ok(());
        }
        let keep = self.frames.len() - n;
        let frame = self.frames[keep];
        self.frames.truncate(keep);
        self.declarations.truncate(frame.declarations);
        self.requirements.truncate(frame.requirements);
        Ok(())
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Same declarations, no requirements and no frames.
    pub fn without_requirements(&self) -> Module {
        Module {
            sigma: self.sigma.clone(),
            declarations: self.declarations.clone(),
            requirements: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Boolean variables in declaration order.
    pub fn propositions(&self) -> impl Iterator<Item = &Symbol> {
        self.declarations
            .iter()
            .filter(|o| o.is_proposition())
            .map(Object::symbol)
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.declarations == other.declarations && self.requirements == other.requirements
    }
}

impl Eq for Module {}

impl Hash for Module {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declarations.hash(state);
        self.requirements.hash(state);
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for object in &self.declarations {
            writeln!(f, "declare {object}")?;
        }
        for formula in &self.requirements {
            writeln!(f, "require {formula}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltlsat_logic::{Foltl, Ltl};

    #[test]
    fn redeclaring_with_the_same_type_returns_the_same_object() {
        let sigma = Alphabet::new();
        let mut m = Module::new(&sigma);
        let a = m.declare("p", Sort::Boolean).unwrap();
        let b = m.declare("p", Sort::Boolean).unwrap();
        assert_eq!(a, b);
        assert_eq!(m.declarations().len(), 1);
    }

    #[test]
    fn redeclaring_with_another_type_fails() {
        let sigma = Alphabet::new();
        let mut m = Module::new(&sigma);
        m.declare("p", Sort::Boolean).unwrap();
        let err = m.declare("p", Sort::Integer).unwrap_err();
        assert_eq!(
            err,
            ModuleError::DuplicateDeclaration {
                name: "p".to_string(),
                existing: SymbolType::Value(Sort::Boolean),
                requested: SymbolType::Value(Sort::Integer),
            }
        );
    }

    #[test]
    fn requirements_must_be_declared_formulas() {
        let sigma = Alphabet::new();
        let b = sigma.builder::<Foltl>();
        let mut m = Module::new(&sigma);
        let p = b.proposition("p").unwrap();
        assert_eq!(
            m.require(&p),
            Err(ModuleError::UnboundSymbol {
                name: "p".to_string()
            })
        );
        m.declare("p", Sort::Boolean).unwrap();
        m.require(&p).unwrap();

        let c = b.constant(3).unwrap();
        assert_eq!(m.require(&c), Err(ModuleError::NotAFormula));

        let other = Alphabet::new();
        let q = other.builder::<Ltl>().proposition("p").unwrap();
        assert_eq!(m.require(&q), Err(ModuleError::ForeignAlphabet));
    }

    #[test]
    fn bound_variables_need_no_declaration() {
        let sigma = Alphabet::new();
        let b = sigma.builder::<Foltl>();
        let x = sigma.symbol("x", Sort::Integer);
        let f = b
            .exists(&x, &b.equal(&b.var(&x).unwrap(), &b.constant(0).unwrap()).unwrap())
            .unwrap();
        let mut m = Module::new(&sigma);
        m.require(&f).unwrap();
    }

    #[test]
    fn pop_discards_everything_since_the_push() {
        let sigma = Alphabet::new();
        let b = sigma.builder::<Ltl>();
        let mut m = Module::new(&sigma);
        m.declare("p", Sort::Boolean).unwrap();
        let before = m.clone();
        m.push();
        m.declare("q", Sort::Boolean).unwrap();
        m.require(b.proposition("q").unwrap()).unwrap();
        m.push();
        m.require(b.proposition("p").unwrap()).unwrap();
        m.pop(2).unwrap();
        assert_eq!(m, before);
        assert_eq!(
            m.pop(1),
            Err(ModuleError::PopUnderflow {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn fresh_names_avoid_existing_declarations() {
        let sigma = Alphabet::new();
        let mut m = Module::new(&sigma);
        m.declare("x0", Sort::Boolean).unwrap();
        let a = m.fresh("x", Sort::Boolean);
        let b = m.fresh("x", Sort::Boolean);
        assert_eq!(a.name(), "x1");
        assert_eq!(b.name(), "x2");
    }

    #[test]
    fn fresh_names_avoid_bound_variables_of_requirements() {
        let sigma = Alphabet::new();
        let b = sigma.builder::<Foltl>();
        let mut m = Module::new(&sigma);
        let bound = sigma.symbol("x0", Sort::Boolean);
        m.require(b.exists(&bound, &b.proposition("x0").unwrap()).unwrap())
            .unwrap();
        let fresh = m.fresh("x", Sort::Boolean);
        assert_eq!(fresh.name(), "x1");
        assert_ne!(fresh.symbol(), &bound);
    }

    #[test]
    fn display_lists_declarations_then_requirements() {
        let sigma = Alphabet::new();
        let b = sigma.builder::<Ltl>();
        let mut m = Module::new(&sigma);
        m.declare("p", Sort::Boolean).unwrap();
        m.require(b.eventually(&b.proposition("p").unwrap()).unwrap())
            .unwrap();
        assert_eq!(m.to_string(), "declare p: Bool\nrequire (F p)\n");
    }
}
