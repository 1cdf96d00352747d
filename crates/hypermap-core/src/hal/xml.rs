//! HAL+XML rendering and parsing.
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <resource rel="orders" href="http://api.test/orders/A1">
//!   <link rel="Items" href="http://api.test/lineitems?$filter=..."/>
//!   <Total>12.5</Total>
//!   <resource rel="Customer" href="http://api.test/customers/7">
//!     <Name>Ada</Name>
//!   </resource>
//! </resource>
//! ```
//!
//! Unlike HAL+JSON, this format is read as well as written.

use std::io::Write;
use std::sync::Arc;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::model::{Link, Links, Relation, Resource, ResourceCollection, Value};
use crate::schema::{EntitySchema, PropertyKind, PropertySchema, SchemaRegistry};

use super::FormatError;

const RESOURCE: &str = "resource";
const LINK: &str = "link";
const REL: &str = "rel";
const HREF: &str = "href";
const TITLE: &str = "title";
const TEMPLATED: &str = "templated";
const NIL: &str = "nil";

/// Writes and reads `application/hal+xml`.
#[derive(Debug, Clone)]
pub struct HalXmlSerializer {
    registry: Arc<SchemaRegistry>,
    omit_defaults: bool,
}

impl HalXmlSerializer {
    /// `omit_defaults` applies to properties that do not declare their own
    /// omit-default policy.
    pub fn new(registry: Arc<SchemaRegistry>, omit_defaults: bool) -> Self {
        Self {
            registry,
            omit_defaults,
        }
    }

    pub fn omit_defaults(&self) -> bool {
        self.omit_defaults
    }

    // =========================================================================
    // Writing
    // =========================================================================

    pub fn to_vec(&self, resource: &Resource) -> Result<Vec<u8>, FormatError> {
        let mut writer = Writer::new(Vec::new());
        write_declaration(&mut writer)?;
        self.write_resource(&mut writer, resource, None)?;
        Ok(writer.into_inner())
    }

    pub fn to_string(&self, resource: &Resource) -> Result<String, FormatError> {
        let bytes = self.to_vec(resource)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn collection_to_vec(&self, collection: &ResourceCollection) -> Result<Vec<u8>, FormatError> {
        let mut writer = Writer::new(Vec::new());
        write_declaration(&mut writer)?;
        self.write_collection(&mut writer, collection, None)?;
        Ok(writer.into_inner())
    }

    pub fn collection_to_string(
        &self,
        collection: &ResourceCollection,
    ) -> Result<String, FormatError> {
        let bytes = self.collection_to_vec(collection)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write one `<resource>` element and everything below it.
    ///
    /// The element's `rel` is `rel` when given, else the resource's own rel,
    /// else its type name.
    pub fn write_resource<W: Write>(
        &self,
        writer: &mut Writer<W>,
        resource: &Resource,
        rel: Option<&str>,
    ) -> Result<(), FormatError> {
        let schema = self.schema(&resource.type_name)?;
        let rel = rel
            .or(resource.rel.as_deref())
            .unwrap_or(&resource.type_name);

        writer.write_event(Event::Start(resource_start(rel, resource.links.self_href())))?;
        write_links(writer, &resource.links)?;

        for property in schema.state_properties() {
            let Some(value) = resource.get(&property.name) else {
                continue;
            };
            if property.should_emit(value, self.omit_defaults) {
                write_value(writer, property.output_name(), value)?;
            }
        }

        for property in schema.navigation_properties() {
            if property.emit.ignore {
                continue;
            }
            match resource.relation(&property.name) {
                Some(Relation::Single(Some(child))) => {
                    self.write_resource(writer, child, Some(property.output_name()))?;
                }
                Some(Relation::Many(Some(collection))) => {
                    self.write_collection(writer, collection, Some(property.output_name()))?;
                }
                _ => {}
            }
        }

        writer.write_event(Event::End(BytesEnd::new(RESOURCE)))?;
        Ok(())
    }

    /// Write a collection as a `<resource>` element wrapping its items.
    pub fn write_collection<W: Write>(
        &self,
        writer: &mut Writer<W>,
        collection: &ResourceCollection,
        rel: Option<&str>,
    ) -> Result<(), FormatError> {
        let rel = rel.unwrap_or(&collection.rel);
        writer.write_event(Event::Start(resource_start(rel, collection.links.self_href())))?;
        write_links(writer, &collection.links)?;
        for item in &collection.items {
            self.write_resource(writer, item, None)?;
        }
        writer.write_event(Event::End(BytesEnd::new(RESOURCE)))?;
        Ok(())
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Parse a document whose root `<resource>` is an entity of `type_name`.
    pub fn read_resource(&self, bytes: &[u8], type_name: &str) -> Result<Resource, FormatError> {
        let text = std::str::from_utf8(bytes)?;
        let mut parser = Parser {
            reader: Reader::from_str(text),
            registry: &self.registry,
        };
        let (start, empty) = parser.root()?;
        parser.resource(&start, empty, type_name)
    }

    /// Parse a document whose root `<resource>` is a collection of
    /// `element_type` items.
    pub fn read_collection(
        &self,
        bytes: &[u8],
        element_type: &str,
    ) -> Result<ResourceCollection, FormatError> {
        let text = std::str::from_utf8(bytes)?;
        let mut parser = Parser {
            reader: Reader::from_str(text),
            registry: &self.registry,
        };
        let (start, empty) = parser.root()?;
        parser.collection(&start, empty, element_type)
    }

    fn schema(&self, type_name: &str) -> Result<&EntitySchema, FormatError> {
        self.registry
            .get(type_name)
            .ok_or_else(|| FormatError::UnknownType(type_name.to_string()))
    }
}

fn write_declaration<W: Write>(writer: &mut Writer<W>) -> Result<(), FormatError> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    Ok(())
}

fn resource_start<'a>(rel: &'a str, href: Option<&'a str>) -> BytesStart<'a> {
    let mut start = BytesStart::new(RESOURCE);
    start.push_attribute((REL, rel));
    if let Some(href) = href {
        start.push_attribute((HREF, href));
    }
    start
}

/// Every link except `self`, which travels as the `href` attribute.
fn write_links<W: Write>(writer: &mut Writer<W>, links: &Links) -> Result<(), FormatError> {
    for link in links.non_self() {
        let mut element = BytesStart::new(LINK);
        element.push_attribute((REL, link.rel()));
        element.push_attribute((HREF, link.href()));
        if let Some(title) = link.title() {
            element.push_attribute((TITLE, title));
        }
        if link.is_templated() {
            element.push_attribute((TEMPLATED, "true"));
        }
        writer.write_event(Event::Empty(element))?;
    }
    Ok(())
}

fn write_value<W: Write>(writer: &mut Writer<W>, name: &str, value: &Value) -> Result<(), FormatError> {
    if value.is_null() {
        let mut element = BytesStart::new(name);
        element.push_attribute((NIL, "true"));
        writer.write_event(Event::Empty(element))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new(name)))?;
    let text = value.to_string();
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&text)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
    registry: &'a SchemaRegistry,
}

impl<'a> Parser<'a> {
    /// Skip the prolog and return the root `<resource>` start tag.
    fn root(&mut self) -> Result<(BytesStart<'a>, bool), FormatError> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == RESOURCE.as_bytes() => {
                    return Ok((e, false))
                }
                Event::Empty(e) if e.local_name().as_ref() == RESOURCE.as_bytes() => {
                    return Ok((e, true))
                }
                Event::Start(e) | Event::Empty(e) => {
                    return Err(FormatError::Structure(format!(
                        "expected <{}> root, found <{}>",
                        RESOURCE,
                        String::from_utf8_lossy(e.local_name().as_ref())
                    )))
                }
                Event::Eof => {
                    return Err(FormatError::Structure("document has no root element".into()))
                }
                _ => {}
            }
        }
    }

    fn resource(
        &mut self,
        start: &BytesStart<'a>,
        empty: bool,
        type_name: &str,
    ) -> Result<Resource, FormatError> {
        let registry = self.registry;
        let schema = registry
            .get(type_name)
            .ok_or_else(|| FormatError::UnknownType(type_name.to_string()))?;

        let mut resource = Resource::new(type_name);
        resource.rel = attribute(start, REL)?;
        if let Some(href) = attribute(start, HREF)? {
            resource.links.set_self(href)?;
        }
        if empty {
            return Ok(resource);
        }

        loop {
            let (element, empty) = match self.reader.read_event()? {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::End(_) => return Ok(resource),
                Event::Eof => return Err(unexpected_eof()),
                _ => continue,
            };
            let local = element.local_name();
            let name = std::str::from_utf8(local.as_ref())?;

            if name == LINK {
                resource.links.add(self.link(&element, empty)?);
            } else if name == RESOURCE {
                let rel = attribute(&element, REL)?.unwrap_or_default();
                let Some(property) = schema
                    .property_by_output_name(&rel)
                    .filter(|p| p.kind.is_navigation())
                else {
                    self.skip(&element, empty)?;
                    continue;
                };
                let relation = match &property.kind {
                    PropertyKind::Collection(target) => {
                        Relation::many(self.collection(&element, empty, target)?)
                    }
                    PropertyKind::Reference(target) => {
                        Relation::single(self.resource(&element, empty, target)?)
                    }
                    PropertyKind::State(_) => continue,
                };
                resource.relations.insert(property.name.clone(), relation);
            } else if let Some(property) = schema
                .property_by_output_name(name)
                .filter(|p| !p.kind.is_navigation())
            {
                let value = self.value(&element, empty, property)?;
                resource.state.insert(property.name.clone(), value);
            } else {
                self.skip(&element, empty)?;
            }
        }
    }

    fn collection(
        &mut self,
        start: &BytesStart<'a>,
        empty: bool,
        element_type: &str,
    ) -> Result<ResourceCollection, FormatError> {
        let rel = attribute(start, REL)?.unwrap_or_default();
        let mut collection = ResourceCollection::new(element_type, rel);
        if let Some(href) = attribute(start, HREF)? {
            collection.links.set_self(href)?;
        }
        if empty {
            return Ok(collection);
        }

        loop {
            let (element, empty) = match self.reader.read_event()? {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::End(_) => return Ok(collection),
                Event::Eof => return Err(unexpected_eof()),
                _ => continue,
            };
            let local = element.local_name();
            match local.as_ref() {
                b"link" => collection.links.add(self.link(&element, empty)?),
                b"resource" => collection.push(self.resource(&element, empty, element_type)?),
                _ => self.skip(&element, empty)?,
            }
        }
    }

    fn link(&mut self, element: &BytesStart<'a>, empty: bool) -> Result<Link, FormatError> {
        let rel = attribute(element, REL)?.unwrap_or_default();
        let href = attribute(element, HREF)?.unwrap_or_default();
        let mut link = Link::new(rel, href)?;
        if let Some(title) = attribute(element, TITLE)? {
            link = link.with_title(title);
        }
        if attribute(element, TEMPLATED)?.is_some_and(|t| t.eq_ignore_ascii_case("true")) {
            link = link.templated();
        }
        self.skip(element, empty)?;
        Ok(link)
    }

    fn value(
        &mut self,
        element: &BytesStart<'a>,
        empty: bool,
        property: &PropertySchema,
    ) -> Result<Value, FormatError> {
        let nil = attribute(element, NIL)?.is_some_and(|n| n.eq_ignore_ascii_case("true"));

        let mut text = String::new();
        if !empty {
            loop {
                match self.reader.read_event()? {
                    Event::Text(t) => text.push_str(&t.unescape()?),
                    Event::CData(c) => text.push_str(std::str::from_utf8(&c)?),
                    Event::End(_) => break,
                    Event::Start(e) | Event::Empty(e) => {
                        return Err(FormatError::Structure(format!(
                            "unexpected <{}> inside {}",
                            String::from_utf8_lossy(e.local_name().as_ref()),
                            property.name
                        )))
                    }
                    Event::Eof => return Err(unexpected_eof()),
                    _ => {}
                }
            }
        }

        if nil {
            return Ok(Value::Null);
        }
        let PropertyKind::State(kind) = property.kind else {
            return Ok(Value::Null);
        };
        Value::parse(&text, kind).ok_or_else(|| FormatError::InvalidValue {
            property: property.name.clone(),
            text,
        })
    }

    /// Consume an element this parser has no use for.
    fn skip(&mut self, element: &BytesStart<'a>, empty: bool) -> Result<(), FormatError> {
        if !empty {
            self.reader.read_to_end(element.name())?;
        }
        Ok(())
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, FormatError> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn unexpected_eof() -> FormatError {
    FormatError::Structure("unexpected end of document".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueKind;
    use crate::schema::EntitySchema;

    fn registry() -> Arc<SchemaRegistry> {
        Arc::new(
            SchemaRegistry::builder()
                .register(
                    EntitySchema::new("Product")
                        .with(PropertySchema::state("Id", ValueKind::Int).key().included())
                        .with(PropertySchema::state("Name", ValueKind::String).included())
                        .with(PropertySchema::state("Stock", ValueKind::Int).included())
                        .with(
                            PropertySchema::state("Note", ValueKind::String)
                                .included()
                                .omit_default(false),
                        ),
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_writes_self_href_as_attribute() {
        let serializer = HalXmlSerializer::new(registry(), true);
        let mut product = Resource::new("Product")
            .with_state("Id", 42)
            .with_state("Name", "Widget");
        product.rel = Some("products".into());
        product.links.set_self("http://api.test/products/42").unwrap();

        let xml = serializer.to_string(&product).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(
            "<resource rel=\"products\" href=\"http://api.test/products/42\">"
        ));
        assert!(xml.contains("<Name>Widget</Name>"));
        assert!(!xml.contains("<link"));
    }

    #[test]
    fn test_omits_defaults_unless_property_opts_out() {
        let serializer = HalXmlSerializer::new(registry(), true);
        let product = Resource::new("Product")
            .with_state("Id", 1)
            .with_state("Stock", 0)
            .with_state("Note", Value::Null);

        let xml = serializer.to_string(&product).unwrap();
        assert!(!xml.contains("<Stock>"));
        assert!(xml.contains("<Note nil=\"true\"/>"));

        let lenient = HalXmlSerializer::new(registry(), false);
        let xml = lenient.to_string(&product).unwrap();
        assert!(xml.contains("<Stock>0</Stock>"));
    }

    #[test]
    fn test_reads_escaped_text_and_nil() {
        let serializer = HalXmlSerializer::new(registry(), true);
        let xml = br#"<resource rel="products" href="http://api.test/products/3">
            <link rel="related" href="http://api.test/x" title="X"/>
            <Name>Nuts &amp; Bolts</Name>
            <Note nil="true"/>
            <Unknown><Deep/></Unknown>
        </resource>"#;

        let product = serializer.read_resource(xml, "Product").unwrap();
        assert_eq!(product.links.self_href(), Some("http://api.test/products/3"));
        assert_eq!(product.get("Name"), Some(&Value::from("Nuts & Bolts")));
        assert_eq!(product.get("Note"), Some(&Value::Null));
        assert_eq!(product.links.get("related").and_then(|l| l.title()), Some("X"));
    }

    #[test]
    fn test_rejects_unparseable_value() {
        let serializer = HalXmlSerializer::new(registry(), true);
        let err = serializer
            .read_resource(b"<resource rel=\"p\"><Id>abc</Id></resource>", "Product")
            .unwrap_err();
        assert!(matches!(err, FormatError::InvalidValue { .. }));
    }

    #[test]
    fn test_rejects_wrong_root() {
        let serializer = HalXmlSerializer::new(registry(), true);
        let err = serializer.read_resource(b"<product/>", "Product").unwrap_err();
        assert!(matches!(err, FormatError::Structure(_)));
    }
}
