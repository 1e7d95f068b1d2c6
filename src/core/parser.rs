//! Binding declaration parser.
//!
//! Turns every `wc="kind:Property,kind:Property"` attribute under the bound
//! region into [`BindingRecord`]s and picks, per element, the record its
//! change listener writes through.

use crate::config::BinderConfig;
use crate::domain::model::{AccessorKind, BindingRecord, ElementId};
use crate::domain::ports::ElementAccess;
use crate::utils::error::{BindError, Result};
use std::collections::BTreeMap;

const GENERATED_ID_LEN: usize = 24;

#[derive(Debug, Clone, Default)]
pub struct ParsedBindings {
    /// Declaration order across the whole region.
    pub records: Vec<BindingRecord>,
    /// Element id to the index of the record its change listener writes through.
    pub listeners: BTreeMap<ElementId, usize>,
}

/// Splits one attribute value into `(kind, property)` pairs.
pub fn parse_declaration(element: &ElementId, attribute_value: &str) -> Result<Vec<(AccessorKind, String)>> {
    attribute_value
        .split(',')
        .map(|declaration| {
            let malformed = || BindError::MalformedBinding {
                element: element.to_string(),
                declaration: declaration.trim().to_string(),
            };
            let (kind, property) = declaration.split_once(':').ok_or_else(malformed)?;
            let (kind, property) = (kind.trim(), property.trim());
            if kind.is_empty() || property.is_empty() || property.contains(':') {
                return Err(malformed());
            }
            Ok((AccessorKind::parse(kind), property.to_string()))
        })
        .collect()
}

/// `prefix` followed by 24 random lowercase hex characters.
pub fn generate_id(prefix: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &token[..GENERATED_ID_LEN])
}

/// Index of the record an element's listener writes through: its last `val`
/// binding, or its last binding when it has no `val`.
fn listener_target(records: &[BindingRecord], first: usize) -> usize {
    let own = &records[first..];
    let offset = own
        .iter()
        .rposition(|r| r.kind == AccessorKind::Val)
        .unwrap_or(own.len() - 1);
    first + offset
}

pub fn scan<D: ElementAccess + ?Sized>(
    dom: &mut D,
    region: &ElementId,
    config: &BinderConfig,
) -> Result<ParsedBindings> {
    let declared = dom.query_declared(region, &config.attribute)?;
    let mut parsed = ParsedBindings::default();

    for element in declared {
        let id = match element.id.as_deref().map(str::trim) {
            Some(existing) if !existing.is_empty() => ElementId::new(existing),
            _ => {
                let mut candidate = generate_id(&config.id_prefix);
                while dom.contains(&ElementId::new(candidate.as_str())) {
                    candidate = generate_id(&config.id_prefix);
                }
                dom.assign_id(element.node, &candidate)?;
                tracing::trace!("Assigned generated id #{}", candidate);
                ElementId::new(candidate)
            }
        };

        if parsed.listeners.contains_key(&id) {
            return Err(BindError::ConfigError {
                message: format!("element id #{} is declared more than once in the bound region", id),
            });
        }

        let first = parsed.records.len();
        for (kind, property) in parse_declaration(&id, &element.declaration)? {
            parsed.records.push(BindingRecord {
                element: id.clone(),
                property,
                kind,
            });
        }

        parsed.listeners.insert(id, listener_target(&parsed.records, first));
    }

    tracing::debug!(
        "Parsed {} bindings on {} elements under #{}",
        parsed.records.len(),
        parsed.listeners.len(),
        region
    );
    Ok(parsed)
}
