//! Human-readable rendering of structural differences between two types.
//!
//! Builds two parallel colorized strings as the [`zip_types`] walk proceeds,
//! wrapping mismatched elements in red so a mismatch buried inside a large
//! aggregate is visible at a glance.

use crate::error::{IrError, IrResult};
use crate::ids::TypeId;
use crate::types::{Type, TypeDb};
use crate::zip_types::{zip_types, ZipParent, ZipTypesCallbacks};
use vesper_common::Interner;

const ANSI_RESET: &str = "\x1b[0m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_BOLD_ON: &str = "\x1b[1m";
const ANSI_BOLD_OFF: &str = "\x1b[22m";

/// Callbacks that accumulate the colorized renderings and the list of
/// mismatched element pairs.
struct DiffCallbacks<'a> {
    db: &'a TypeDb,
    interner: &'a Interner,
    colorized_lhs: String,
    colorized_rhs: String,
    mismatches: Vec<(String, String)>,
    match_count: usize,
}

impl<'a> DiffCallbacks<'a> {
    fn new(db: &'a TypeDb, interner: &'a Interner) -> Self {
        Self {
            db,
            interner,
            colorized_lhs: String::new(),
            colorized_rhs: String::new(),
            mismatches: Vec::new(),
            match_count: 0,
        }
    }

    fn add_matched_both(&mut self, text: &str) {
        self.colorized_lhs.push_str(text);
        self.colorized_rhs.push_str(text);
    }

    fn add_mismatched(&mut self, lhs: &str, rhs: &str) {
        self.colorized_lhs
            .push_str(&format!("{ANSI_RED}{lhs}{ANSI_RESET}"));
        self.colorized_rhs
            .push_str(&format!("{ANSI_RED}{rhs}{ANSI_RESET}"));
    }

    /// Emits the struct field prefix before an element.
    fn before_element(&mut self, parent: Option<&ZipParent>) {
        let Some(parent) = parent else { return };
        if let Type::Struct { fields, .. } = self.db.get(parent.lhs) {
            let field = self.interner.resolve(fields[parent.index].0).to_string();
            self.add_matched_both(&format!("{field}: "));
        }
    }

    /// Emits the separator after a non-last tuple or struct element.
    fn after_element(&mut self, parent: Option<&ZipParent>) {
        let Some(parent) = parent else { return };
        let separated = matches!(
            self.db.get(parent.lhs),
            Type::Struct { .. } | Type::Tuple { .. }
        );
        if separated && parent.index + 1 != parent.count {
            self.add_matched_both(", ");
        }
    }
}

impl ZipTypesCallbacks for DiffCallbacks<'_> {
    fn aggregate_start(
        &mut self,
        lhs: TypeId,
        _rhs: TypeId,
        parent: Option<&ZipParent>,
    ) -> IrResult<()> {
        self.before_element(parent);
        match self.db.get(lhs) {
            Type::Tuple { .. } => self.add_matched_both("("),
            Type::Struct { name, .. } => {
                let opener = format!("{}{{", self.interner.resolve(*name));
                self.add_matched_both(&opener);
            }
            // The array marker goes at the end, after the element type.
            Type::Array { .. } => {}
            Type::Chan { .. } => self.add_matched_both("chan("),
            Type::Meta { .. } => self.add_matched_both("typeof("),
            Type::Function { .. } => {
                return Err(IrError::Unimplemented(
                    "Cannot print diffs of function types.".to_string(),
                ));
            }
            Type::Bits { .. } => unreachable!("bits is not an aggregate"),
        }
        Ok(())
    }

    fn aggregate_end(
        &mut self,
        lhs: TypeId,
        rhs: TypeId,
        parent: Option<&ZipParent>,
    ) -> IrResult<()> {
        match (self.db.get(lhs), self.db.get(rhs)) {
            (Type::Tuple { .. }, _) => self.add_matched_both(")"),
            (Type::Struct { .. }, _) => self.add_matched_both("}"),
            (Type::Array { size: lsize, .. }, Type::Array { size: rsize, .. }) => {
                // Sizes may differ while the element types matched, so each
                // side renders its own size.
                let (lsize, rsize) = (*lsize, *rsize);
                self.colorized_lhs.push_str(&format!("[{lsize}]"));
                self.colorized_rhs.push_str(&format!("[{rsize}]"));
            }
            (Type::Chan { .. }, _) | (Type::Meta { .. }, _) => self.add_matched_both(")"),
            (Type::Function { .. }, _) => {
                return Err(IrError::Unimplemented(
                    "Cannot print diffs of function types.".to_string(),
                ));
            }
            _ => unreachable!("aggregate_end on non-aggregate"),
        }
        self.after_element(parent);
        Ok(())
    }

    fn matched_leaf(
        &mut self,
        lhs: TypeId,
        rhs: TypeId,
        parent: Option<&ZipParent>,
    ) -> IrResult<()> {
        self.match_count += 1;
        self.before_element(parent);
        let lhs_text = self.db.render(lhs, self.interner);
        let rhs_text = self.db.render(rhs, self.interner);
        self.colorized_lhs.push_str(&lhs_text);
        self.colorized_rhs.push_str(&rhs_text);
        self.after_element(parent);
        Ok(())
    }

    fn type_mismatch(
        &mut self,
        lhs: TypeId,
        rhs: TypeId,
        parent: Option<&ZipParent>,
    ) -> IrResult<()> {
        let lhs_text = self.db.render(lhs, self.interner);
        let rhs_text = self.db.render(rhs, self.interner);
        self.mismatches.push((lhs_text.clone(), rhs_text.clone()));
        self.before_element(parent);
        self.add_mismatched(&lhs_text, &rhs_text);
        self.after_element(parent);
        Ok(())
    }
}

/// Renders a human-readable description of the structural differences
/// between `lhs` and `rhs`.
///
/// When nothing at all matched — the top-level shapes already disagree —
/// the result is a plain three-line report. Otherwise the mismatched
/// element pairs are listed first, followed by both types rendered in full
/// with the mismatched portions wrapped in red.
///
/// Function types cannot be diffed; attempting to produces
/// [`IrError::Unimplemented`].
pub fn format_type_mismatch(
    lhs: TypeId,
    rhs: TypeId,
    db: &TypeDb,
    interner: &Interner,
) -> IrResult<String> {
    let mut callbacks = DiffCallbacks::new(db, interner);
    zip_types(lhs, rhs, db, &mut callbacks)?;

    let mut lines = Vec::new();
    if callbacks.match_count == 0 {
        lines.push("Type mismatch:".to_string());
        lines.push(format!("   {}", db.render(lhs, interner)));
        lines.push(format!("vs {}", db.render(rhs, interner)));
    } else {
        lines.push(format!(
            "{ANSI_RESET}Mismatched elements {ANSI_BOLD_ON}within{ANSI_BOLD_OFF} type:"
        ));
        for (lhs_mismatch, rhs_mismatch) in &callbacks.mismatches {
            lines.push(format!("   {lhs_mismatch}"));
            lines.push(format!("vs {rhs_mismatch}"));
        }
        lines.push(format!(
            "{ANSI_BOLD_ON}Overall{ANSI_BOLD_OFF} type mismatch:"
        ));
        lines.push(format!("{ANSI_RESET}   {}", callbacks.colorized_lhs));
        lines.push(format!("vs {}", callbacks.colorized_rhs));
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TypeDb, Interner) {
        (TypeDb::new(), Interner::new())
    }

    #[test]
    fn single_element_mismatch_in_tuple() {
        let (mut db, interner) = setup();
        let b8 = db.bits(8);
        let b16 = db.bits(16);
        let lhs = db.intern(Type::Tuple {
            elements: vec![b8, b8],
        });
        let rhs = db.intern(Type::Tuple {
            elements: vec![b8, b16],
        });
        let out = format_type_mismatch(lhs, rhs, &db, &interner).unwrap();
        assert!(out.contains("Mismatched elements"));
        assert!(out.contains("   bits[8]\nvs bits[16]"));
        // Only the second element is red-wrapped.
        assert!(out.contains(&format!("(bits[8], {ANSI_RED}bits[8]{ANSI_RESET})")));
        assert!(out.contains(&format!("(bits[8], {ANSI_RED}bits[16]{ANSI_RESET})")));
        // Exactly one recorded mismatch pair.
        assert_eq!(out.matches("vs bits[16]").count(), 1);
    }

    #[test]
    fn top_level_mismatch_uses_plain_form() {
        let (mut db, interner) = setup();
        let b8 = db.bits(8);
        let b16 = db.bits(16);
        let out = format_type_mismatch(b8, b16, &db, &interner).unwrap();
        assert_eq!(out, "Type mismatch:\n   bits[8]\nvs bits[16]");
    }

    #[test]
    fn equal_types_have_no_mismatch_list() {
        let (mut db, interner) = setup();
        let b8 = db.bits(8);
        let ty = db.intern(Type::Tuple {
            elements: vec![b8, b8],
        });
        let out = format_type_mismatch(ty, ty, &db, &interner).unwrap();
        assert!(out.contains("Mismatched elements"));
        assert!(!out.contains(ANSI_RED));
        assert!(out.contains("(bits[8], bits[8])"));
    }

    #[test]
    fn function_types_are_unsupported() {
        let (mut db, interner) = setup();
        let b8 = db.bits(8);
        let f = db.intern(Type::Function {
            params: vec![b8],
            ret: b8,
        });
        let err = format_type_mismatch(f, f, &db, &interner).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Cannot print diffs of function types"));
    }

    #[test]
    fn struct_fields_are_labeled() {
        let (mut db, interner) = setup();
        let b8 = db.bits(8);
        let b16 = db.bits(16);
        let name = interner.get_or_intern("Point");
        let x = interner.get_or_intern("x");
        let y = interner.get_or_intern("y");
        let lhs = db.intern(Type::Struct {
            name,
            fields: vec![(x, b8), (y, b8)],
        });
        let rhs = db.intern(Type::Struct {
            name,
            fields: vec![(x, b8), (y, b16)],
        });
        let out = format_type_mismatch(lhs, rhs, &db, &interner).unwrap();
        assert!(out.contains(&format!("Point{{x: bits[8], y: {ANSI_RED}bits[8]{ANSI_RESET}}}")));
        assert!(out.contains(&format!("Point{{x: bits[8], y: {ANSI_RED}bits[16]{ANSI_RESET}}}")));
    }

    #[test]
    fn array_sizes_render_per_side() {
        let (mut db, interner) = setup();
        let b8 = db.bits(8);
        let lhs = db.intern(Type::Array {
            element: b8,
            size: 4,
        });
        let rhs = db.intern(Type::Array {
            element: b8,
            size: 7,
        });
        let out = format_type_mismatch(lhs, rhs, &db, &interner).unwrap();
        assert!(out.contains("   bits[8][4]"));
        assert!(out.contains("vs bits[8][7]"));
    }

    #[test]
    fn differently_named_structs_mismatch_whole() {
        let (mut db, interner) = setup();
        let b8 = db.bits(8);
        let x = interner.get_or_intern("x");
        let lhs = db.intern(Type::Struct {
            name: interner.get_or_intern("Point"),
            fields: vec![(x, b8)],
        });
        let rhs = db.intern(Type::Struct {
            name: interner.get_or_intern("Coord"),
            fields: vec![(x, b8)],
        });
        let out = format_type_mismatch(lhs, rhs, &db, &interner).unwrap();
        assert_eq!(
            out,
            "Type mismatch:\n   Point{x: bits[8]}\nvs Coord{x: bits[8]}"
        );
    }

    #[test]
    fn channel_payload_mismatch() {
        let (mut db, interner) = setup();
        let b8 = db.bits(8);
        let b16 = db.bits(16);
        let lhs = db.intern(Type::Chan { payload: b8 });
        let rhs = db.intern(Type::Chan { payload: b16 });
        let out = format_type_mismatch(lhs, rhs, &db, &interner).unwrap();
        assert!(out.contains(&format!("chan({ANSI_RED}bits[8]{ANSI_RESET})")));
        assert!(out.contains(&format!("chan({ANSI_RED}bits[16]{ANSI_RESET})")));
    }
}
