//! Lowers a parsed schema into a [`peechy_schema::Schema`], whose codecs are
//! interpreted at run time. Aliases disappear here: every reference to an
//! alias is replaced by what it finally names.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use peechy_schema::{Def, DefKind, Field as RuntimeField, FieldType, Primitive, Schema as RuntimeSchema};

use crate::{
    error::PeechyError,
    types::{Definition, DefinitionKind, Field, Schema},
    utils::{quote, semantic_error},
    verifier::Visit,
};

struct Lowering<'a> {
    definitions: HashMap<&'a str, &'a Definition>,
    aliases:     HashMap<&'a str, &'a str>,
    indices:     HashMap<&'a str, usize>,
}

impl<'a> Lowering<'a> {
    fn new(schema: &'a Schema) -> Self {
        let mut definitions = HashMap::new();
        let mut aliases = HashMap::new();
        let mut indices = HashMap::new();
        for def in &schema.definitions {
            definitions.insert(def.name.as_str(), def);
            if def.kind == DefinitionKind::Alias {
                if let Some(target) = def.fields.first() {
                    aliases.insert(def.name.as_str(), target.name.as_str());
                }
            } else {
                let index = indices.len();
                indices.insert(def.name.as_str(), index);
            }
        }
        Lowering {
            definitions,
            aliases,
            indices,
        }
    }

    /// Follows alias chains to the name they finally refer to.
    fn resolve_alias(&self, name: &'a str, field: &Field) -> Result<&'a str, PeechyError> {
        let mut seen = HashSet::new();
        let mut current = name;
        while let Some(&target) = self.aliases.get(current) {
            if !seen.insert(current) {
                return Err(semantic_error(
                    &format!("Alias {} refers to itself", quote(name)),
                    field.line,
                    field.column,
                ));
            }
            current = target;
        }
        Ok(current)
    }

    fn field_type(&self, field: &'a Field) -> Result<FieldType, PeechyError> {
        let name = match field.type_.as_deref() {
            Some(name) => self.resolve_alias(name, field)?,
            None => {
                return Err(semantic_error(
                    &format!("Missing type for field {}", quote(&field.name)),
                    field.line,
                    field.column,
                ))
            }
        };
        if let Some(primitive) = Primitive::from_name(name) {
            return Ok(FieldType::Primitive(primitive));
        }
        match self.indices.get(name) {
            Some(&index) => Ok(FieldType::Def(index)),
            None => Err(semantic_error(
                &format!("Invalid type {} for field {}", quote(name), quote(&field.name)),
                field.line,
                field.column,
            )),
        }
    }

    fn lower(&self, def: &'a Definition) -> Result<Def, PeechyError> {
        let kind = match def.kind {
            DefinitionKind::Enum => DefKind::Enum,
            DefinitionKind::Smol => DefKind::Smol,
            DefinitionKind::Struct => DefKind::Struct,
            DefinitionKind::Message => DefKind::Message,
            DefinitionKind::Union => DefKind::Union,
            DefinitionKind::Alias | DefinitionKind::Pick | DefinitionKind::Entity => {
                return Err(semantic_error(
                    &format!("Invalid definition kind {}", quote(def.kind.as_str())),
                    def.line,
                    def.column,
                ))
            }
        };

        let fields: Vec<RuntimeField> = match kind {
            DefKind::Enum => def
                .fields
                .iter()
                .map(|field| RuntimeField::new(&field.name, None, field.value as u32))
                .collect(),
            DefKind::Smol => def
                .fields
                .iter()
                .map(|field| Ok(RuntimeField::new(&field.name, None, byte_value(field)?.into())))
                .collect::<Result<_, PeechyError>>()?,
            DefKind::Union => def
                .members()
                .iter()
                .map(|member| self.lower_member(def, member))
                .collect::<Result<_, _>>()?,
            DefKind::Struct | DefKind::Message => def
                .fields
                .iter()
                .map(|field| self.lower_field(kind, field))
                .collect::<Result<_, _>>()?,
        };

        let mut lowered = Def::new(def.name.clone(), kind, fields);
        if let Some(discriminator) = def.discriminator() {
            lowered = lowered.with_discriminator(&discriminator.name);
        }
        if let Some(ref path) = def.serializer_path {
            lowered = lowered.with_serializer_path(path);
        }
        trace!("lowered {} {} with {} fields", def.kind.as_str(), def.name, lowered.fields.len());
        Ok(lowered)
    }

    fn lower_field(&self, kind: DefKind, field: &'a Field) -> Result<RuntimeField, PeechyError> {
        let value = match kind {
            DefKind::Message => byte_value(field)?.into(),
            _ => u32::try_from(field.value).map_err(|_| {
                semantic_error(
                    &format!("The id for field {} must be positive", quote(&field.name)),
                    field.line,
                    field.column,
                )
            })?,
        };
        let mut lowered = RuntimeField::new(&field.name, Some(self.field_type(field)?), value);
        lowered.is_array = field.is_array;
        lowered.is_required = field.is_required;
        lowered.is_deprecated = field.is_deprecated;
        Ok(lowered)
    }

    fn lower_member(&self, union: &Definition, member: &'a Field) -> Result<RuntimeField, PeechyError> {
        let name = self.resolve_alias(member.type_.as_deref().unwrap_or(member.name.as_str()), member)?;
        let is_record = self.definitions.get(name).map_or(false, |def| {
            matches!(
                def.kind,
                DefinitionKind::Struct | DefinitionKind::Message | DefinitionKind::Union
            )
        });
        let index = match self.indices.get(name) {
            Some(&index) if is_record => index,
            _ => {
                return Err(semantic_error(
                    &format!(
                        "Union {} can only contain structs, messages and unions, not {}",
                        quote(&union.name),
                        quote(name)
                    ),
                    member.line,
                    member.column,
                ))
            }
        };
        Ok(RuntimeField::new(name, Some(FieldType::Def(index)), byte_value(member)?.into()).required())
    }
}

/// Message tags, union tags and smol values travel as a single byte.
fn byte_value(field: &Field) -> Result<u8, PeechyError> {
    u8::try_from(field.value).map_err(|_| {
        semantic_error(
            &format!("The value of {} must fit in a single byte", quote(&field.name)),
            field.line,
            field.column,
        )
    })
}

/// Struct fields carry no tag, so a struct reaching itself through non-array
/// struct fields would decode forever without reading a byte. Returns the
/// index of a struct on such a cycle.
fn find_struct_cycle(defs: &[Def]) -> Option<usize> {
    let is_struct = |index: usize| defs.get(index).map_or(false, |def| def.kind == DefKind::Struct);
    let mut state: Vec<Option<Visit>> = vec![None; defs.len()];

    for root in 0..defs.len() {
        if !is_struct(root) || state[root].is_some() {
            continue;
        }
        state[root] = Some(Visit::Visiting);
        let mut stack = vec![(root, 0usize)];
        while let Some(top) = stack.last_mut() {
            let (index, position) = *top;
            let field = match defs[index].fields.get(position) {
                Some(field) => field,
                None => {
                    state[index] = Some(Visit::Done);
                    stack.pop();
                    continue;
                }
            };
            top.1 += 1;
            let child = match field.type_ {
                Some(FieldType::Def(child)) if !field.is_array && is_struct(child) => child,
                _ => continue,
            };
            match state[child] {
                Some(Visit::Visiting) => return Some(child),
                Some(Visit::Done) => {}
                None => {
                    state[child] = Some(Visit::Visiting);
                    stack.push((child, 0));
                }
            }
        }
    }
    None
}

/// Build the runtime codecs for a verified schema. Aliases are resolved away;
/// `ENTITY` definitions have no codec and are rejected.
pub fn compile_schema_to_codecs(schema: &Schema) -> Result<RuntimeSchema, PeechyError> {
    let lowering = Lowering::new(schema);
    let sources: Vec<&Definition> = schema
        .definitions
        .iter()
        .filter(|def| def.kind != DefinitionKind::Alias)
        .collect();
    let defs = sources
        .iter()
        .map(|&def| lowering.lower(def))
        .collect::<Result<Vec<_>, _>>()?;

    // Binary schemas skip the verifier
    if let Some(index) = find_struct_cycle(&defs) {
        let source = sources[index];
        return Err(semantic_error(
            &format!("Recursive nesting of {} is not allowed", quote(&source.name)),
            source.line,
            source.column,
        ));
    }

    let runtime = RuntimeSchema::new(defs).with_package(schema.package.clone());
    debug!(
        "built codecs for {} definitions with {} exports",
        runtime.defs.len(),
        runtime.exports().len()
    );
    Ok(runtime)
}
