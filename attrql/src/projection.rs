use crate::ast::{Expr, NativeType};
use crate::column::ColumnHandle;
use crate::error::FilterError;
use crate::operator::CastTag;
use crate::path::AttributePath;

impl From<CastTag> for NativeType {
    fn from(tag: CastTag) -> Self {
        match tag {
            CastTag::Float => NativeType::Float,
            CastTag::Integer => NativeType::Integer,
            CastTag::Boolean => NativeType::Boolean,
            CastTag::Text => NativeType::Text,
            CastTag::RawJson => NativeType::Json,
            CastTag::DateTime => NativeType::Timestamp,
        }
    }
}

/// Read expression for projecting or ordering by the value at `path`.
///
/// Without a tag the value is returned as untyped JSON for the caller to decode. With a tag the read is
/// converted to that native type. No guard is added: projecting a value that cannot be converted is a query
/// error, not an empty result.
///
/// `Integer` truncates toward zero (`7.9` reads as `7`, `-7.9` as `-7`); values outside the 64-bit range fail.
pub fn build_projection_expression<C: ColumnHandle>(column: &C, path: &AttributePath, cast: Option<CastTag>) -> Expr {
    match cast {
        None => column.json(path),
        Some(tag) => column.cast(path, tag.into()),
    }
}

/// Same as [`build_projection_expression`], with the tag given by name (`f`, `i`, `b`, `t`, `j`, `d` or the long form).
pub fn build_projection_from_tag<C: ColumnHandle>(column: &C, path: &str, cast: Option<&str>) -> Result<Expr, FilterError> {
    let cast = cast.map(str::parse::<CastTag>).transpose()?;
    Ok(build_projection_expression(column, &AttributePath::parse(path), cast))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::JsonColumn;

    #[test]
    fn test_untagged_projection_is_raw_json() {
        let column = JsonColumn::new("attributes");
        let path = AttributePath::parse("energy");
        assert_eq!(build_projection_expression(&column, &path, None), Expr::Json(column.at(&path)));
    }

    #[test]
    fn test_tagged_projection_casts() {
        let column = JsonColumn::new("attributes");
        let path = AttributePath::parse("count");
        assert_eq!(build_projection_expression(&column, &path, Some(CastTag::Integer)), Expr::Text(column.at(&path)).cast(NativeType::Integer));
        assert_eq!(build_projection_expression(&column, &path, Some(CastTag::Text)), Expr::Text(column.at(&path)));
        assert_eq!(build_projection_expression(&column, &path, Some(CastTag::RawJson)), Expr::Json(column.at(&path)).cast(NativeType::Json));
        assert_eq!(
            build_projection_expression(&column, &path, Some(CastTag::DateTime)),
            Expr::Text(column.at(&path)).cast(NativeType::Timestamp)
        );
    }

    #[test]
    fn test_unknown_tag() {
        let column = JsonColumn::new("attributes");
        let err = build_projection_from_tag(&column, "count", Some("q")).unwrap_err();
        assert_eq!(err, FilterError::UnknownCastTag("q".into()));
        assert!(build_projection_from_tag(&column, "count", Some("f")).is_ok());
        assert!(build_projection_from_tag(&column, "count", None).is_ok());
    }
}
