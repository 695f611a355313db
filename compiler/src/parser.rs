use crate::{
    error::PeechyError,
    tokenizer::Token,
    types::{Definition, DefinitionKind, Field, Schema},
    utils::{quote, syntax_error},
};
use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER:       Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref EQUALS:           Regex = Regex::new(r"^=$").unwrap();
    static ref SEMICOLON:        Regex = Regex::new(r"^;$").unwrap();
    static ref COLON:            Regex = Regex::new(r"^:$").unwrap();
    static ref INTEGER:          Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref LEFT_BRACE:       Regex = Regex::new(r"^\{$").unwrap();
    static ref RIGHT_BRACE:      Regex = Regex::new(r"^\}$").unwrap();
    static ref ARRAY_TOKEN:      Regex = Regex::new(r"^\[\]$").unwrap();
    static ref STRING_LITERAL:   Regex = Regex::new(r#"^"[^"\n]*"$"#).unwrap();
    static ref ENUM_KEYWORD:     Regex = Regex::new(r"^enum$").unwrap();
    static ref SMOL_KEYWORD:     Regex = Regex::new(r"^smol$").unwrap();
    static ref PICK_KEYWORD:     Regex = Regex::new(r"^pick$").unwrap();
    static ref STRUCT_KEYWORD:   Regex = Regex::new(r"^struct$").unwrap();
    static ref MESSAGE_KEYWORD:  Regex = Regex::new(r"^message$").unwrap();
    static ref ENTITY_KEYWORD:   Regex = Regex::new(r"^entity$").unwrap();
    static ref UNION_KEYWORD:    Regex = Regex::new(r"^union$").unwrap();
    static ref ALIAS_KEYWORD:    Regex = Regex::new(r"^alias$").unwrap();
    static ref PACKAGE_KEYWORD:  Regex = Regex::new(r"^package$").unwrap();
    static ref FROM_KEYWORD:     Regex = Regex::new(r"^from$").unwrap();
    static ref UNION_OR:         Regex = Regex::new(r"^\|$").unwrap();
    static ref EXTENDS_TOKEN:    Regex = Regex::new(r"^&$").unwrap();
    static ref REQUIRED_TOKEN:   Regex = Regex::new(r"^\[!\]$").unwrap();
    static ref DEPRECATED_TOKEN: Regex = Regex::new(r"^\[deprecated\]$").unwrap();
    static ref EOF:              Regex = Regex::new(r"^$").unwrap();
}

/// A `pick` waiting to be resolved once every definition has been read.
#[derive(Debug, Clone, PartialEq)]
pub struct PickSpec {
    pub to:          Token,
    pub from:        Token,
    pub field_names: Vec<String>,
}

fn current_token(tokens: &[Token], index: usize) -> &Token {
    // The end-of-file token is sticky.
    &tokens[index.min(tokens.len() - 1)]
}

fn eat(tokens: &[Token], index: &mut usize, test: &Regex) -> bool {
    if test.is_match(&current_token(tokens, *index).text) {
        *index += 1;
        true
    } else {
        false
    }
}

fn expect(tokens: &[Token], index: &mut usize, test: &Regex, expected: &str) -> Result<(), PeechyError> {
    if !eat(tokens, index, test) {
        let tok = current_token(tokens, *index);
        return Err(syntax_error(
            &format!("Expected {} but found {}", expected, quote(&tok.text)),
            tok.line,
            tok.column,
        ));
    }
    Ok(())
}

fn unexpected_token(tokens: &[Token], index: usize) -> PeechyError {
    let tok = current_token(tokens, index);
    syntax_error(&format!("Unexpected token {}", quote(&tok.text)), tok.line, tok.column)
}

/// Reads an integer that must survive a round trip through `i32`, so `007`,
/// `-0` and out-of-range values are rejected.
fn expect_integer(tokens: &[Token], index: &mut usize) -> Result<i32, PeechyError> {
    let tok = current_token(tokens, *index).clone();
    expect(tokens, index, &INTEGER, "integer")?;
    match tok.text.parse::<i32>() {
        Ok(value) if value.to_string() == tok.text => Ok(value),
        _ => Err(syntax_error(
            &format!("Invalid integer {}", quote(&tok.text)),
            tok.line,
            tok.column,
        )),
    }
}

fn type_field(tok: &Token, value: i32) -> Field {
    Field {
        name:          tok.text.clone(),
        line:          tok.line,
        column:        tok.column,
        type_:         Some(tok.text.clone()),
        is_array:      false,
        is_required:   true,
        is_deprecated: false,
        value,
    }
}

pub fn parse_schema(tokens: &[Token]) -> Result<Schema, PeechyError> {
    if tokens.is_empty() {
        return Err(syntax_error("Unexpected end of input", 1, 1));
    }

    let mut definitions = Vec::new();
    let mut picks = Vec::new();
    let mut package_text = None;
    let mut index = 0;

    if eat(tokens, &mut index, &PACKAGE_KEYWORD) {
        let pkg_tok = current_token(tokens, index);
        expect(tokens, &mut index, &IDENTIFIER, "identifier")?;
        package_text = Some(pkg_tok.text.clone());
        expect(tokens, &mut index, &SEMICOLON, "\";\"")?;
    }

    while index < tokens.len() && !eat(tokens, &mut index, &EOF) {
        let kind = if eat(tokens, &mut index, &ENUM_KEYWORD) {
            DefinitionKind::Enum
        } else if eat(tokens, &mut index, &SMOL_KEYWORD) {
            DefinitionKind::Smol
        } else if eat(tokens, &mut index, &PICK_KEYWORD) {
            DefinitionKind::Pick
        } else if eat(tokens, &mut index, &STRUCT_KEYWORD) {
            DefinitionKind::Struct
        } else if eat(tokens, &mut index, &MESSAGE_KEYWORD) {
            DefinitionKind::Message
        } else if eat(tokens, &mut index, &ENTITY_KEYWORD) {
            DefinitionKind::Entity
        } else if eat(tokens, &mut index, &UNION_KEYWORD) {
            DefinitionKind::Union
        } else if eat(tokens, &mut index, &ALIAS_KEYWORD) {
            DefinitionKind::Alias
        } else {
            return Err(unexpected_token(tokens, index));
        };

        let name_tok = current_token(tokens, index).clone();
        expect(tokens, &mut index, &IDENTIFIER, "identifier")?;

        let mut fields: Vec<Field> = Vec::new();
        let mut extensions = Vec::new();
        let mut serializer_path = None;

        match kind {
            DefinitionKind::Pick => {
                expect(tokens, &mut index, &COLON, "\":\"")?;
                let from = current_token(tokens, index).clone();
                expect(tokens, &mut index, &IDENTIFIER, "identifier")?;
                expect(tokens, &mut index, &LEFT_BRACE, "\"{\"")?;

                let mut field_names: Vec<String> = Vec::new();
                while !eat(tokens, &mut index, &RIGHT_BRACE) {
                    let field = current_token(tokens, index);
                    expect(tokens, &mut index, &IDENTIFIER, "identifier")?;
                    if field_names.contains(&field.text) {
                        return Err(syntax_error("Fields must be unique", field.line, field.column));
                    }
                    field_names.push(field.text.clone());
                    expect(tokens, &mut index, &SEMICOLON, "\";\"")?;
                }

                picks.push(PickSpec {
                    to: name_tok,
                    from,
                    field_names,
                });
                continue;
            }

            DefinitionKind::Union => {
                expect(tokens, &mut index, &EQUALS, "\"=\"")?;
                loop {
                    let member = current_token(tokens, index);
                    expect(tokens, &mut index, &IDENTIFIER, "identifier")?;
                    fields.push(type_field(member, fields.len() as i32 + 1));
                    if !eat(tokens, &mut index, &UNION_OR) {
                        break;
                    }
                }

                if eat(tokens, &mut index, &LEFT_BRACE) {
                    let tok = current_token(tokens, index);
                    expect(tokens, &mut index, &IDENTIFIER, "discriminator name")?;
                    fields.insert(
                        0,
                        Field {
                            name:          tok.text.clone(),
                            line:          tok.line,
                            column:        tok.column,
                            type_:         Some("discriminator".to_string()),
                            is_array:      false,
                            is_required:   true,
                            is_deprecated: false,
                            value:         0,
                        },
                    );
                    expect(tokens, &mut index, &SEMICOLON, "\";\"")?;
                    expect(tokens, &mut index, &RIGHT_BRACE, "\"}\"")?;
                    eat(tokens, &mut index, &SEMICOLON);
                } else {
                    expect(tokens, &mut index, &SEMICOLON, "\";\"")?;
                }
            }

            DefinitionKind::Alias => {
                expect(tokens, &mut index, &EQUALS, "\"=\"")?;
                let target = current_token(tokens, index);
                expect(tokens, &mut index, &IDENTIFIER, "identifier")?;
                fields.push(type_field(target, 1));
                expect(tokens, &mut index, &SEMICOLON, "\";\"")?;
            }

            _ => {
                if kind == DefinitionKind::Struct {
                    while eat(tokens, &mut index, &EXTENDS_TOKEN) {
                        let parent = current_token(tokens, index);
                        expect(tokens, &mut index, &IDENTIFIER, "identifier")?;
                        extensions.push(parent.text.clone());
                    }
                }

                if eat(tokens, &mut index, &FROM_KEYWORD) {
                    let path = current_token(tokens, index);
                    expect(tokens, &mut index, &STRING_LITERAL, "quoted path")?;
                    let path = path.text.trim_matches('"');
                    if !path.trim().is_empty() {
                        serializer_path = Some(path.to_string());
                    }
                }

                expect(tokens, &mut index, &LEFT_BRACE, "\"{\"")?;

                let is_enum = matches!(kind, DefinitionKind::Enum | DefinitionKind::Smol);
                while !eat(tokens, &mut index, &RIGHT_BRACE) {
                    let mut type_opt = None;
                    let mut is_array = false;
                    let mut is_deprecated = false;

                    if !is_enum {
                        let t_tok = current_token(tokens, index);
                        expect(tokens, &mut index, &IDENTIFIER, "identifier")?;
                        is_array = eat(tokens, &mut index, &ARRAY_TOKEN);
                        type_opt = Some(t_tok.text.clone());
                    }

                    let f_tok = current_token(tokens, index);
                    expect(tokens, &mut index, &IDENTIFIER, "identifier")?;

                    // Enum members always carry a value, field ids are optional
                    let value = if is_enum {
                        expect(tokens, &mut index, &EQUALS, "\"=\"")?;
                        expect_integer(tokens, &mut index)?
                    } else if eat(tokens, &mut index, &EQUALS) {
                        expect_integer(tokens, &mut index)?
                    } else {
                        fields.len() as i32 + 1
                    };

                    let is_required = eat(tokens, &mut index, &REQUIRED_TOKEN) || kind == DefinitionKind::Struct;

                    let deprecated = current_token(tokens, index);
                    if eat(tokens, &mut index, &DEPRECATED_TOKEN) {
                        if kind != DefinitionKind::Message {
                            return Err(syntax_error(
                                "Cannot deprecate this field",
                                deprecated.line,
                                deprecated.column,
                            ));
                        }
                        is_deprecated = true;
                    }

                    expect(tokens, &mut index, &SEMICOLON, "\";\"")?;

                    fields.push(Field {
                        name: f_tok.text.clone(),
                        line: f_tok.line,
                        column: f_tok.column,
                        type_: type_opt,
                        is_array,
                        is_required,
                        is_deprecated,
                        value,
                    });
                }
            }
        }

        definitions.push(Definition {
            name: name_tok.text,
            line: name_tok.line,
            column: name_tok.column,
            kind,
            fields,
            extensions,
            serializer_path,
        });
    }

    apply_extensions(&mut definitions)?;
    resolve_picks(&mut definitions, &picks)?;

    debug!(
        "parsed {} definitions ({} from picks) in package {:?}",
        definitions.len(),
        picks.len(),
        package_text
    );
    Ok(Schema {
        package: package_text,
        definitions,
    })
}

/// Copies the fields of every parent struct onto the end of the extending
/// struct, offsetting their ids by the number of fields already present.
/// Definitions are processed in order, so a parent that appears earlier has
/// already been flattened.
pub fn apply_extensions(definitions: &mut [Definition]) -> Result<(), PeechyError> {
    for i in 0..definitions.len() {
        for extension in definitions[i].extensions.clone() {
            let parent = definitions
                .iter()
                .find(|def| def.name == extension && def.kind == DefinitionKind::Struct);
            let inherited = match parent {
                Some(parent) => parent.fields.clone(),
                None => {
                    let def = &definitions[i];
                    return Err(syntax_error(
                        &format!("Expected {} to be a struct", quote(&extension)),
                        def.line,
                        def.column,
                    ));
                }
            };

            let def = &mut definitions[i];
            let offset = def.fields.len() as i32;
            trace!("{} inherits {} fields from {}", def.name, inherited.len(), extension);
            def.fields.extend(inherited.into_iter().map(|field| Field {
                value: field.value + offset,
                ..field
            }));
        }
    }
    Ok(())
}

/// Turns each pick into a struct holding the named fields of its source, in
/// the order they were asked for. Picked fields are always required and
/// never deprecated, since struct fields are always written and read.
pub fn resolve_picks(definitions: &mut Vec<Definition>, picks: &[PickSpec]) -> Result<(), PeechyError> {
    for pick in picks {
        let source = definitions
            .iter()
            .find(|def| def.name == pick.from.text)
            .ok_or_else(|| syntax_error("Expected type for part to exist", pick.from.line, pick.from.column))?;

        let mut fields = Vec::with_capacity(pick.field_names.len());
        for (i, name) in pick.field_names.iter().enumerate() {
            let field = source.fields.iter().find(|field| &field.name == name).ok_or_else(|| {
                syntax_error(
                    &format!("Expected field {} to exist in {}", name, source.name),
                    pick.from.line,
                    pick.from.column,
                )
            })?;
            fields.push(Field {
                is_required: true,
                is_deprecated: false,
                value: i as i32 + 1,
                ..field.clone()
            });
        }

        definitions.push(Definition {
            name: pick.to.text.clone(),
            line: pick.to.line,
            column: pick.to.column,
            kind: DefinitionKind::Struct,
            fields,
            extensions: Vec::new(),
            serializer_path: None,
        });
    }
    Ok(())
}
