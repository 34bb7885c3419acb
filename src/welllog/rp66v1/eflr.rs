//! Explicitly Formatted Logical Records: a Set, a Template and Objects.
//!
//! ```text
//! SET (type, [name])
//! TEMPLATE  ATTRIB label, count, rep code, units, [default value]
//!           ATTRIB ...
//! OBJECT    OBNAME
//!           ATTRIB / ABSATR, one per non-invariant template attribute,
//!                   missing characteristics taken from the template
//! OBJECT    ...
//! ```
//!
//! Invariant template attributes have no component in the objects, every
//! object carries the template's copy. Objects may stop early, the remaining
//! attributes then come from the template.

use log::{debug, trace, warn};
use std::collections::HashMap;
use std::fmt;

use super::component::{ComponentDescriptor, Role};
use crate::welllog::codec::rp66v1::{self as rc, read_ident, read_obname, read_uvari};
use crate::welllog::cursor::LogicalData;
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::types::models::{ObName, Value};
use crate::welllog::utils::display_text;

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub descriptor: ComponentDescriptor,
    pub label: Vec<u8>,
    pub count: u32,
    pub rep_code: u8,
    pub units: Vec<u8>,
    pub value: Option<Vec<Value>>,
}

impl Attribute {
    /// Characteristics when neither the component nor the template give them.
    fn global_default(descriptor: ComponentDescriptor) -> Self {
        Self {
            descriptor,
            label: Vec::new(),
            count: 1,
            rep_code: rc::IDENT,
            units: Vec::new(),
            value: None,
        }
    }

    /// Read the characteristics the descriptor flags, the rest from `defaults`.
    fn read(descriptor: ComponentDescriptor, ld: &mut LogicalData, defaults: &Attribute) -> Result<Self> {
        let label = if descriptor.has_label() {
            read_ident(ld)?
        } else {
            defaults.label.clone()
        };
        let count = if descriptor.has_count() {
            read_uvari(ld)?
        } else {
            defaults.count
        };
        let rep_code = if descriptor.has_rep_code() {
            ld.read()?
        } else {
            defaults.rep_code
        };
        let units = if descriptor.has_units() {
            read_ident(ld)?
        } else {
            defaults.units.clone()
        };
        let value = if descriptor.has_value() {
            Some((0..count).map(|_| rc::read(rep_code, ld)).collect::<Result<Vec<_>>>()?)
        } else {
            defaults.value.clone()
        };
        Ok(Self {
            descriptor,
            label,
            count,
            rep_code,
            units,
            value,
        })
    }

    /// The template attribute as it appears in an object with no value.
    fn absent(descriptor: ComponentDescriptor, template: &Attribute) -> Self {
        Self {
            descriptor,
            value: None,
            ..template.clone()
        }
    }

    pub fn is_absent(&self) -> bool {
        self.descriptor.is_absent_attribute()
    }

    /// The first value as a number, if there is one.
    pub fn first_f64(&self) -> Option<f64> {
        self.value.as_ref()?.first()?.as_f64()
    }

    /// All values that are numbers, in order.
    pub fn values_f64(&self) -> Vec<f64> {
        self.value
            .iter()
            .flatten()
            .filter_map(Value::as_f64)
            .collect()
    }

    /// The value alone, a single value bare and several as a list. `-` for
    /// no value.
    pub fn value_string(&self) -> String {
        match self.value.as_deref() {
            None => "-".to_string(),
            Some([single]) => single.to_string(),
            Some(many) => format!(
                "[{}]",
                many.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
            ),
        }
    }

    /// The value followed by its units, if any.
    pub fn stringify_value(&self) -> String {
        if self.units.is_empty() {
            self.value_string()
        } else {
            format!("{} [{}]", self.value_string(), display_text(&self.units))
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CD: {} L: {} C: {} R: {} U: {} V: {}",
            self.descriptor,
            display_text(&self.label),
            self.count,
            rc::name(self.rep_code).unwrap_or("?"),
            display_text(&self.units),
            self.value_string()
        )
    }
}

/// The Set component that opens every EFLR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EflrSet {
    pub role: Role,
    pub type_name: Vec<u8>,
    pub name: Vec<u8>,
}

impl EflrSet {
    fn read(ld: &mut LogicalData) -> Result<Self> {
        let descriptor = ComponentDescriptor::new(ld.read()?)?;
        if !descriptor.is_set_group() {
            return Err(WellLogError::MalformedEflr(format!(
                "expected a set component, found {}",
                descriptor.role().name()
            )));
        }
        let type_name = read_ident(ld)?;
        let name = if descriptor.has_set_name() {
            read_ident(ld)?
        } else {
            Vec::new()
        };
        Ok(Self {
            role: descriptor.role(),
            type_name,
            name,
        })
    }
}

impl fmt::Display for EflrSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EFLR Set type: {} name: {}",
            display_text(&self.type_name),
            display_text(&self.name)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    attrs: Vec<Attribute>,
    label_map: HashMap<Vec<u8>, usize>,
}

impl Template {
    /// Read attribute components up to the first object or the end of data.
    fn read(ld: &mut LogicalData) -> Result<Self> {
        let mut template = Self::default();
        while ld.has_remaining() {
            let descriptor = ComponentDescriptor::new(ld.peek()?)?;
            if descriptor.is_object() {
                break;
            }
            if !descriptor.is_attribute_group() {
                return Err(WellLogError::MalformedEflr(format!(
                    "expected an attribute in the template, found {}",
                    descriptor.role().name()
                )));
            }
            ld.read()?;
            let attr = Attribute::read(descriptor, ld, &Attribute::global_default(descriptor))?;
            if template.label_map.contains_key(&attr.label) {
                return Err(WellLogError::MalformedEflr(format!(
                    "duplicate template label {}",
                    display_text(&attr.label)
                )));
            }
            trace!("Template attribute: {}", attr);
            template.label_map.insert(attr.label.clone(), template.attrs.len());
            template.attrs.push(attr);
        }
        Ok(template)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn get(&self, label: &[u8]) -> Option<&Attribute> {
        self.label_map.get(label).map(|&i| &self.attrs[i])
    }

    pub fn header_as_strings(&self) -> Vec<String> {
        self.attrs.iter().map(|a| display_text(&a.label)).collect()
    }
}

/// One row of an EFLR, an attribute for every template attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: ObName,
    attrs: Vec<Attribute>,
    label_map: HashMap<Vec<u8>, usize>,
}

impl Object {
    fn read(ld: &mut LogicalData, template: &Template) -> Result<Self> {
        let descriptor = ComponentDescriptor::new(ld.read()?)?;
        if !descriptor.is_object() {
            return Err(WellLogError::MalformedEflr(format!(
                "expected an object, found {}",
                descriptor.role().name()
            )));
        }
        let name = read_obname(ld)?;
        let mut attrs = Vec::with_capacity(template.len());
        for template_attr in &template.attrs {
            if template_attr.descriptor.is_invariant_attribute() {
                attrs.push(template_attr.clone());
                continue;
            }
            if !ld.has_remaining() || ComponentDescriptor::new(ld.peek()?)?.is_object() {
                attrs.push(template_attr.clone());
                continue;
            }
            let descriptor = ComponentDescriptor::new(ld.read()?)?;
            let attr = match descriptor.role() {
                Role::AbsentAttribute => Attribute::absent(descriptor, template_attr),
                Role::Attribute => Attribute::read(descriptor, ld, template_attr)?,
                other => {
                    return Err(WellLogError::MalformedEflr(format!(
                        "object {} has a {} component where an attribute was expected",
                        name,
                        other.name()
                    )))
                }
            };
            attrs.push(attr);
        }
        if ld.has_remaining() && !ComponentDescriptor::new(ld.peek()?)?.is_object() {
            return Err(WellLogError::MalformedEflr(format!(
                "object {} has more attributes than the template's {}",
                name,
                template.len()
            )));
        }
        let mut label_map = HashMap::with_capacity(attrs.len());
        for (a, attr) in attrs.iter().enumerate() {
            if label_map.insert(attr.label.clone(), a).is_some() {
                return Err(WellLogError::MalformedEflr(format!(
                    "object {} has duplicate attribute label {}",
                    name,
                    display_text(&attr.label)
                )));
            }
        }
        Ok(Self {
            name,
            attrs,
            label_map,
        })
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn get(&self, label: &[u8]) -> Option<&Attribute> {
        self.label_map.get(label).map(|&i| &self.attrs[i])
    }

    /// The values of attribute `label`, if present and not absent.
    pub fn value(&self, label: &[u8]) -> Option<&[Value]> {
        self.get(label)?.value.as_deref()
    }

    pub fn values_as_strings(&self) -> Vec<String> {
        self.attrs.iter().map(Attribute::stringify_value).collect()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for attr in &self.attrs {
            write!(f, "\n  {}", attr)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitlyFormattedLogicalRecord {
    pub lr_type: u8,
    pub set: EflrSet,
    pub template: Template,
    objects: Vec<Object>,
    object_map: HashMap<ObName, usize>,
}

impl ExplicitlyFormattedLogicalRecord {
    /// Decode an EFLR from its logical data, read from the start.
    ///
    /// An object whose name repeats an earlier one is dropped, the first is
    /// kept.
    ///
    /// # Errors
    /// `MalformedEflr` for any structural problem including data that ends
    /// mid component, `UnsupportedRepCode` for an unknown attribute code.
    pub fn new(lr_type: u8, ld: &mut LogicalData) -> Result<Self> {
        ld.rewind();
        Self::read(lr_type, ld).map_err(|e| match e {
            WellLogError::Eof {
                offset,
                wanted,
                available,
            } => WellLogError::MalformedEflr(format!(
                "logical data ends at {}: wanted {} bytes, {} available",
                offset, wanted, available
            )),
            other => other,
        })
    }

    fn read(lr_type: u8, ld: &mut LogicalData) -> Result<Self> {
        let set = EflrSet::read(ld)?;
        let template = Template::read(ld)?;
        if template.is_empty() && ld.has_remaining() {
            return Err(WellLogError::MalformedEflr(format!(
                "{}: object found before any template attributes",
                set
            )));
        }
        let mut objects: Vec<Object> = Vec::new();
        let mut object_map = HashMap::new();
        while ld.has_remaining() {
            let object = Object::read(ld, &template)?;
            match object_map.get(&object.name) {
                Some(&existing) => {
                    if objects[existing] == object {
                        debug!("Ignoring duplicate object {} already seen in the {}", object.name, set);
                    } else {
                        warn!("Ignoring different object {} already seen in the {}", object.name, set);
                        warn!("WAS:\n{}", objects[existing]);
                        warn!("NOW:\n{}", object);
                    }
                }
                None => {
                    object_map.insert(object.name.clone(), objects.len());
                    objects.push(object);
                }
            }
        }
        Ok(Self {
            lr_type,
            set,
            template,
            objects,
            object_map,
        })
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn get(&self, index: usize) -> Result<&Object> {
        self.objects
            .get(index)
            .ok_or_else(|| WellLogError::index("object", index as i64, self.objects.len()))
    }

    pub fn by_name(&self, name: &ObName) -> Option<&Object> {
        self.object_map.get(name).map(|&i| &self.objects[i])
    }

    /// `(objects, template attributes)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.objects.len(), self.template.len())
    }

    /// Header row then one row per object, optionally sorted by name.
    pub fn table_as_strings(&self, sort: bool) -> Vec<Vec<String>> {
        let mut header = vec!["ObjectName IDENT".to_string()];
        header.extend(self.template.header_as_strings());
        let mut objects: Vec<&Object> = self.objects.iter().collect();
        if sort {
            objects.sort_by(|a, b| a.name.cmp(&b.name));
        }
        let mut rows = vec![header];
        for obj in objects {
            let mut row = vec![obj.name.to_string()];
            row.extend(obj.values_as_strings());
            rows.push(row);
        }
        rows
    }

    pub fn is_key_value(&self) -> bool {
        self.objects.len() == 1
    }

    /// `KEY`/`VALUE` rows for an EFLR with exactly one object.
    ///
    /// # Errors
    /// `InvalidFormat` for any other number of objects.
    pub fn key_values(&self, sort: bool) -> Result<Vec<Vec<String>>> {
        if !self.is_key_value() {
            return Err(WellLogError::InvalidFormat(format!(
                "can not represent {} with {} objects as key/value",
                self.set,
                self.objects.len()
            )));
        }
        let mut pairs: Vec<(String, String)> = self
            .template
            .attrs()
            .iter()
            .zip(self.objects[0].attrs())
            .map(|(t, a)| (display_text(&t.label), a.stringify_value()))
            .collect();
        if sort {
            pairs.sort();
        }
        let mut rows = vec![vec!["KEY".to_string(), "VALUE".to_string()]];
        rows.extend(pairs.into_iter().map(|(k, v)| vec![k, v]));
        Ok(rows)
    }

    /// Identifier to object ordinal, keeping the highest copy number of each.
    pub fn reduced_object_map(&self) -> HashMap<Vec<u8>, usize> {
        let mut map: HashMap<Vec<u8>, usize> = HashMap::new();
        for (index, obj) in self.objects.iter().enumerate() {
            match map.get(&obj.name.ident) {
                Some(&seen) if self.objects[seen].name.copy >= obj.name.copy => {}
                _ => {
                    map.insert(obj.name.ident.clone(), index);
                }
            }
        }
        map
    }

    pub fn str_long(&self) -> String {
        let mut lines = vec![self.to_string(), format!("  Template [{}]:", self.template.len())];
        lines.extend(self.template.attrs().iter().map(|a| format!("    {}", a)));
        lines.push(format!("  Objects [{}]:", self.objects.len()));
        for obj in &self.objects {
            lines.extend(obj.to_string().lines().map(|l| format!("    {}", l)));
        }
        lines.join("\n")
    }
}

impl fmt::Display for ExplicitlyFormattedLogicalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ExplicitlyFormattedLogicalRecord {}>", self.set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::welllog::codec::rp66v1::{write_ident, write_obname, write_uvari};

    /// Builds component streams for tests.
    #[derive(Default)]
    struct Builder(Vec<u8>);

    impl Builder {
        fn set(mut self, type_name: &[u8]) -> Self {
            self.0.push(0xF0);
            self.0.extend(write_ident(type_name).unwrap());
            self
        }

        fn template_attr(mut self, label: &[u8], rep_code: u8) -> Self {
            self.0.push(0x34);
            self.0.extend(write_ident(label).unwrap());
            self.0.push(rep_code);
            self
        }

        fn invariant(mut self, label: &[u8], value: &[u8]) -> Self {
            self.0.push(0x51);
            self.0.extend(write_ident(label).unwrap());
            self.0.extend(write_ident(value).unwrap());
            self
        }

        fn object(mut self, ident: &[u8], copy: u8) -> Self {
            self.0.push(0x70);
            self.0.extend(write_obname(&ObName::new(2, copy, ident)).unwrap());
            self
        }

        fn value_ident(mut self, value: &[u8]) -> Self {
            self.0.push(0x21);
            self.0.extend(write_ident(value).unwrap());
            self
        }

        fn value_uvari(mut self, value: u32) -> Self {
            self.0.push(0x21);
            self.0.extend(write_uvari(value).unwrap());
            self
        }

        fn absent(mut self) -> Self {
            self.0.push(0x00);
            self
        }

        fn build(self) -> LogicalData {
            LogicalData::new(self.0)
        }
    }

    #[test]
    fn template_and_objects() {
        let mut ld = Builder::default()
            .set(b"CHANNEL")
            .template_attr(b"LONG-NAME", rc::IDENT)
            .invariant(b"SOURCE", b"TOOL")
            .template_attr(b"DIMENSION", rc::UVARI)
            .object(b"DEPT", 0)
            .value_ident(b"Depth")
            .value_uvari(1)
            .object(b"GR", 0)
            .absent()
            .object(b"GR", 1)
            .value_ident(b"Gamma Ray")
            .build();
        let eflr = ExplicitlyFormattedLogicalRecord::new(3, &mut ld).unwrap();
        assert_eq!(eflr.set.type_name, b"CHANNEL");
        assert_eq!(eflr.shape(), (3, 3));
        let dept = eflr.by_name(&ObName::new(2, 0, "DEPT")).unwrap();
        assert_eq!(dept.value(b"LONG-NAME"), Some(&[Value::Text(b"Depth".to_vec())][..]));
        assert_eq!(dept.value(b"SOURCE"), Some(&[Value::Text(b"TOOL".to_vec())][..]));
        assert_eq!(dept.value(b"DIMENSION"), Some(&[Value::Int(1)][..]));
        let gr = eflr.get(1).unwrap();
        assert!(gr.get(b"LONG-NAME").unwrap().is_absent());
        assert_eq!(gr.value(b"LONG-NAME"), None);
        assert_eq!(gr.value(b"DIMENSION"), None);
        let reduced = eflr.reduced_object_map();
        assert_eq!(reduced[&b"GR".to_vec()], 2);
        let table = eflr.table_as_strings(false);
        assert_eq!(table[0], vec!["ObjectName IDENT", "LONG-NAME", "SOURCE", "DIMENSION"]);
        assert_eq!(table[1][1], "Depth");
        assert_eq!(table[2][1], "-");
        assert!(eflr.key_values(false).is_err());
    }

    #[test]
    fn key_values_single_object() {
        let mut ld = Builder::default()
            .set(b"FILE-HEADER")
            .template_attr(b"SEQUENCE-NUMBER", rc::IDENT)
            .template_attr(b"ID", rc::IDENT)
            .object(b"5", 0)
            .value_ident(b"1")
            .value_ident(b"MSCT_197LTP")
            .build();
        let eflr = ExplicitlyFormattedLogicalRecord::new(0, &mut ld).unwrap();
        let kv = eflr.key_values(true).unwrap();
        assert_eq!(kv[0], vec!["KEY", "VALUE"]);
        assert_eq!(kv[1], vec!["ID", "MSCT_197LTP"]);
        assert_eq!(kv[2], vec!["SEQUENCE-NUMBER", "1"]);
    }

    #[test]
    fn duplicate_objects_keep_first() {
        let mut ld = Builder::default()
            .set(b"PARAMETER")
            .template_attr(b"VALUES", rc::IDENT)
            .object(b"BS", 0)
            .value_ident(b"8.5")
            .object(b"BS", 0)
            .value_ident(b"12.25")
            .build();
        let eflr = ExplicitlyFormattedLogicalRecord::new(5, &mut ld).unwrap();
        assert_eq!(eflr.len(), 1);
        assert_eq!(eflr.get(0).unwrap().value(b"VALUES"), Some(&[Value::Text(b"8.5".to_vec())][..]));
    }

    #[test]
    fn malformed_records() {
        let mut no_template = Builder::default().set(b"X").object(b"A", 0).build();
        assert!(matches!(
            ExplicitlyFormattedLogicalRecord::new(5, &mut no_template),
            Err(WellLogError::MalformedEflr(_))
        ));
        let mut duplicate_label = Builder::default()
            .set(b"X")
            .template_attr(b"A", rc::IDENT)
            .template_attr(b"A", rc::IDENT)
            .build();
        assert!(ExplicitlyFormattedLogicalRecord::new(5, &mut duplicate_label).is_err());
        let mut too_many = Builder::default()
            .set(b"X")
            .template_attr(b"A", rc::IDENT)
            .object(b"O", 0)
            .value_ident(b"1")
            .value_ident(b"2")
            .build();
        assert!(ExplicitlyFormattedLogicalRecord::new(5, &mut too_many).is_err());
        let mut truncated = Builder::default().set(b"X").template_attr(b"A", rc::IDENT).build();
        let mut bytes = truncated.bytes().to_vec();
        bytes.truncate(bytes.len() - 1);
        truncated = LogicalData::new(bytes);
        assert!(matches!(
            ExplicitlyFormattedLogicalRecord::new(5, &mut truncated),
            Err(WellLogError::MalformedEflr(_))
        ));
    }
}
