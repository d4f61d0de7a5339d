//! Boolean: truth values; no arithmetic.

use sht_ast::Initializer;

use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::DataType;
use crate::value::Instance;

pub struct BooleanType;

impl DataType for BooleanType {
    fn name(&self) -> &str {
        "Boolean"
    }

    fn construct(
        &self,
        rt: &Runtime,
        _init: Option<(&Initializer, &Scope)>,
        args: Vec<Instance>,
    ) -> Eval {
        match args.first() {
            Some(v) => self.to(rt, v),
            None => Ok(Instance::Boolean(false)),
        }
    }

    fn boolean(&self, _rt: &Runtime, this: &Instance) -> Eval<bool> {
        Ok(matches!(this, Instance::Boolean(true)))
    }

    fn repr(&self, _rt: &Runtime, this: &Instance) -> Eval<String> {
        Ok(if matches!(this, Instance::Boolean(true)) { "true" } else { "false" }.to_string())
    }

    fn to(&self, rt: &Runtime, source: &Instance) -> Eval {
        Ok(Instance::Boolean(source.truthy(rt)?))
    }

    fn equals(&self, _rt: &Runtime, this: &Instance, other: &Instance) -> Eval<bool> {
        Ok(matches!((this, other), (Instance::Boolean(a), Instance::Boolean(b)) if a == b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::types::Meta;

    #[test]
    fn test_arithmetic_is_invalid() {
        let rt = Runtime::new(Options::default());
        let t = Instance::Boolean(true);
        let result = BooleanType.binary(&rt, Meta::Add, &t, &t);
        assert!(result.is_err());
    }

    #[test]
    fn test_not_negates() {
        let rt = Runtime::new(Options::default());
        assert!(matches!(
            BooleanType.unary(&rt, Meta::Not, &Instance::Boolean(true)),
            Ok(Instance::Boolean(false))
        ));
    }

    #[test]
    fn test_conversion_uses_truthiness() {
        let rt = Runtime::new(Options::default());
        assert!(matches!(BooleanType.to(&rt, &Instance::string("")), Ok(Instance::Boolean(false))));
        assert!(matches!(BooleanType.to(&rt, &Instance::Number(2.0)), Ok(Instance::Boolean(true))));
    }
}
