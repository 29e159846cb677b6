use sluice_core::{CompositeStructure, StructureKind};

use crate::ini::Record;
use crate::structures::fields::{required_str, u32_or};
use crate::structures::{ParseContext, StructureError, StructureHeader, StructureParser};

/// Compound section: `numStructures` plus `structureIds` separated by `;`.
///
/// Members are resolved against structures accepted earlier in the same file,
/// so a compound must come after the structures it groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeParser;

impl StructureParser for CompositeParser {
    fn parse_kind(
        &self,
        record: &Record,
        _header: &StructureHeader,
        ctx: &mut ParseContext<'_>,
    ) -> Result<StructureKind, StructureError> {
        let ids = required_str(record, "structureIds")?;
        let member_ids: Vec<String> = ids
            .split(';')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();

        let declared = u32_or(record, "numStructures", member_ids.len() as u32)? as usize;
        if declared != member_ids.len() {
            return Err(StructureError::InvalidValue {
                key: "structureIds".to_string(),
                value: ids.to_string(),
                expected: format!("{} ids (numStructures = {})", declared, declared),
                line: record.property("structureIds").map_or(record.line, |p| p.line),
            });
        }

        if let Some(member) = member_ids
            .iter()
            .find(|id| !ctx.parsed.iter().any(|s| &s.name == *id))
        {
            return Err(StructureError::UnresolvedMember {
                member: member.clone(),
            });
        }

        Ok(StructureKind::Composite(CompositeStructure { member_ids }))
    }
}
