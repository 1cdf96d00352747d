//! OData `$filter` expressions for parent → children collection links.

use crate::model::Value;
use crate::schema::PropertySchema;

/// Build the filter selecting the children that point back at one parent.
///
/// `navigation` is the property on the child type that refers to the
/// parent type `parent_type`, whose key is `key_name = key_value`.
///
/// - collection navigation: `Orders/any(Order: Order/Id eq 'A1')`
/// - single navigation: `Order/Id eq 'A1'`
pub fn collection_filter(
    navigation: &PropertySchema,
    parent_type: &str,
    key_name: &str,
    key_value: &Value,
) -> String {
    let literal = key_value.to_odata_literal();
    if navigation.kind.is_collection() {
        format!(
            "{nav}/any({ty}: {ty}/{key} eq {lit})",
            nav = navigation.name,
            ty = parent_type,
            key = key_name,
            lit = literal
        )
    } else {
        format!("{}/{} eq {}", navigation.name, key_name, literal)
    }
}
