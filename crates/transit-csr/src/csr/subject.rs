use std::path::Path;

use const_oid::ObjectIdentifier;
use der::Tag;
use der::asn1::{Any, SetOfVec};
use serde::{Deserialize, Deserializer};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use crate::error::{Result, TransitError};

const COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const PROVINCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const STREET_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.9");
const POSTAL_CODE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.17");
const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const SERIAL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.5");

/// Distinguished name fields of a certificate request subject.
///
/// Deserializes from the JSON layout of Go's `pkix.Name`
/// (`{"CommonName": "...", "Organization": ["..."], ...}`); `null` and
/// missing fields are empty. Values are embedded as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SubjectName {
    #[serde(deserialize_with = "null_as_default")]
    pub country: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub organization: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub organizational_unit: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub locality: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub province: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub street_address: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub postal_code: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub serial_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub common_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub extra_names: Vec<ExtraName>,
}

/// An additional attribute appended after the standard ones, one RDN each.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtraName {
    #[serde(rename = "Type", deserialize_with = "deserialize_oid")]
    pub oid: ObjectIdentifier,
    #[serde(rename = "Value")]
    pub value: String,
}

impl SubjectName {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TransitError::SubjectFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Build the X.509 name: C, ST, L, street, postalCode, O, OU, CN,
    /// serialNumber, then the extra names. All values of one attribute
    /// type share a single RDN; a repeated value starts another RDN of the
    /// same type. A standard attribute is left out when `extra_names`
    /// carries its OID.
    pub fn to_name(&self) -> Result<Name> {
        let mut rdns = Vec::new();
        let standard: [(ObjectIdentifier, &[String]); 9] = [
            (COUNTRY, self.country.as_slice()),
            (PROVINCE, self.province.as_slice()),
            (LOCALITY, self.locality.as_slice()),
            (STREET_ADDRESS, self.street_address.as_slice()),
            (POSTAL_CODE, self.postal_code.as_slice()),
            (ORGANIZATION, self.organization.as_slice()),
            (ORGANIZATIONAL_UNIT, self.organizational_unit.as_slice()),
            (COMMON_NAME, optional(&self.common_name)),
            (SERIAL_NUMBER, optional(&self.serial_number)),
        ];
        for (oid, values) in standard {
            if !self.extra_names.iter().any(|extra| extra.oid == oid) {
                push_rdns(&mut rdns, oid, values)?;
            }
        }
        for extra in &self.extra_names {
            push_rdns(&mut rdns, extra.oid, std::slice::from_ref(&extra.value))?;
        }
        Ok(RdnSequence(rdns))
    }
}

fn optional(value: &String) -> &[String] {
    if value.is_empty() {
        &[]
    } else {
        std::slice::from_ref(value)
    }
}

fn push_rdns(
    rdns: &mut Vec<RelativeDistinguishedName>,
    oid: ObjectIdentifier,
    values: &[String],
) -> Result<()> {
    // a DER SET OF cannot hold the same attribute twice
    let mut groups: Vec<Vec<AttributeTypeAndValue>> = Vec::new();
    for value in values {
        let attribute = AttributeTypeAndValue {
            oid,
            value: directory_string(value)?,
        };
        match groups.iter_mut().find(|group| !group.contains(&attribute)) {
            Some(group) => group.push(attribute),
            None => groups.push(vec![attribute]),
        }
    }
    for group in groups {
        rdns.push(RelativeDistinguishedName(SetOfVec::try_from(group)?));
    }
    Ok(())
}

fn directory_string(value: &str) -> der::Result<Any> {
    let tag = if value.chars().all(is_printable) {
        Tag::PrintableString
    } else {
        Tag::Utf8String
    };
    Any::new(tag, value.as_bytes())
}

fn is_printable(c: char) -> bool {
    c.is_ascii_alphanumeric() || " '()+,-./:=?".contains(c)
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OidRepr {
    Arcs(Vec<u32>),
    Dotted(String),
}

fn deserialize_oid<'de, D>(deserializer: D) -> std::result::Result<ObjectIdentifier, D::Error>
where
    D: Deserializer<'de>,
{
    let dotted = match OidRepr::deserialize(deserializer)? {
        OidRepr::Arcs(arcs) => arcs
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("."),
        OidRepr::Dotted(dotted) => dotted,
    };
    ObjectIdentifier::new(&dotted)
        .map_err(|e| serde::de::Error::custom(format!("invalid OID {dotted:?}: {e}")))
}
