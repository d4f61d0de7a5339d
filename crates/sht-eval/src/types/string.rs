//! String: immutable text, indexed by character.

use std::sync::{Arc, Mutex};

use sht_ast::Initializer;

use crate::error::RuntimeError;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::iterator::{native_iterator, Pull};
use crate::types::iteration::IterationValue;
use crate::types::{resolve_index, resolve_slice, unsupported, DataType, Meta};
use crate::value::{lock, Instance};

pub struct StringType;

fn text(this: &Instance) -> &str {
    match this {
        Instance::String(s) => s,
        _ => "",
    }
}

impl DataType for StringType {
    fn name(&self) -> &str {
        "String"
    }

    fn construct(
        &self,
        rt: &Runtime,
        _init: Option<(&Initializer, &Scope)>,
        args: Vec<Instance>,
    ) -> Eval {
        match args.first() {
            Some(v) => self.to(rt, v),
            None => Ok(rt.empty_string()),
        }
    }

    fn boolean(&self, _rt: &Runtime, this: &Instance) -> Eval<bool> {
        Ok(!text(this).is_empty())
    }

    fn repr(&self, _rt: &Runtime, this: &Instance) -> Eval<String> {
        Ok(text(this).to_string())
    }

    fn len(&self, _rt: &Runtime, this: &Instance) -> Eval {
        Ok(Instance::Number(text(this).chars().count() as f64))
    }

    fn get_item(&self, _rt: &Runtime, this: &Instance, index: &[Instance]) -> Eval {
        let chars: Vec<char> = text(this).chars().collect();
        match index {
            [] => Ok(this.clone()),
            [i] => {
                let i = resolve_index("String", i, chars.len(), false)?;
                Ok(Instance::string(chars[i].to_string()))
            }
            [start, end] => {
                let (s, e) = resolve_slice("String", start, end, chars.len())?;
                Ok(Instance::string(chars[s..e].iter().collect::<String>()))
            }
            _ => Err(RuntimeError::InvalidIndex(format!(
                "String takes at most 2 indices, got {}",
                index.len()
            ))
            .into()),
        }
    }

    fn iter(&self, _rt: &Runtime, this: &Instance) -> Eval {
        let chars: Vec<char> = text(this).chars().collect();
        let position = Mutex::new(0usize);
        Ok(native_iterator(move |rt| {
            let mut i = lock(&position);
            match chars.get(*i) {
                Some(c) => {
                    *i += 1;
                    Ok(IterationValue::item(Instance::string(c.to_string())))
                }
                None => Ok(rt.done()),
            }
        }))
    }

    /// `value as String`: text conversion, or the concatenation of an
    /// iterator's items.
    fn to(&self, rt: &Runtime, source: &Instance) -> Eval {
        if let Instance::Iterator(_) = source {
            let pull = Pull::new(rt, source)?;
            let mut out = String::new();
            while let Some(item) = pull.next_item(rt)? {
                out.push_str(&item.to_text(rt)?);
            }
            return Ok(Instance::string(out));
        }
        Ok(Instance::string(source.to_text(rt)?))
    }

    fn contains(&self, _rt: &Runtime, this: &Instance, item: &Instance) -> Eval<bool> {
        match item {
            Instance::String(needle) => Ok(text(this).contains(needle.as_ref())),
            other => Err(RuntimeError::incompatible("in", other.type_name(), "String").into()),
        }
    }

    fn binary(&self, _rt: &Runtime, meta: Meta, this: &Instance, other: &Instance) -> Eval {
        match (meta, other) {
            (Meta::Add, Instance::String(b)) => {
                let joined: Arc<str> = format!("{}{}", text(this), b).into();
                Ok(Instance::String(joined))
            }
            (Meta::Add, other) => {
                Err(RuntimeError::incompatible("+", "String", other.type_name()).into())
            }
            (meta, _) => Err(unsupported("String", meta).into()),
        }
    }

    fn equals(&self, _rt: &Runtime, this: &Instance, other: &Instance) -> Eval<bool> {
        Ok(matches!(other, Instance::String(b) if text(this) == b.as_ref()))
    }
}
