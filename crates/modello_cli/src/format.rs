//! Text rendering helpers.

use modello_ast::{Context, DisplayExpr, ExprId};
use modello_math::evaluate;

pub fn expr_string(ctx: &Context, id: ExprId) -> String {
    DisplayExpr { context: ctx, id }.to_string()
}

/// Numeric value rounded to `decimals`, when the expression has no symbols.
pub fn approximate(ctx: &Context, id: ExprId, decimals: usize) -> Option<f64> {
    let value = evaluate(ctx, id)?;
    let scale = 10f64.powi(i32::try_from(decimals).ok()?);
    let rounded = (value * scale).round() / scale;
    rounded.is_finite().then_some(rounded)
}

/// Rows as `name = value  # label` with the `=` signs aligned.
pub fn table(rows: &[(String, String, Option<String>)]) -> String {
    let width = rows.iter().map(|(name, _, _)| name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value, label) in rows {
        out.push_str(&format!("  {:<width$} = {}", name, value, width = width));
        if let Some(label) = label {
            out.push_str("  # ");
            out.push_str(label);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use modello_parser::parse;

    #[test]
    fn approximates_numbers_only() {
        let mut ctx = Context::new();
        let third = parse("1/3", &mut ctx).unwrap();
        assert_eq!(approximate(&ctx, third, 3), Some(0.333));
        let x = parse("x + 1", &mut ctx).unwrap();
        assert_eq!(approximate(&ctx, x, 3), None);
    }

    #[test]
    fn table_aligns_names() {
        let rows = vec![
            ("a".to_string(), "1".to_string(), None),
            ("long.path".to_string(), "2".to_string(), Some("Label".to_string())),
        ];
        assert_eq!(table(&rows), "  a         = 1\n  long.path = 2  # Label\n");
    }
}
