// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data object references and the catalog contract used to resolve them.
//!
//! A [`DataObjectReference`] is a weak link to another top-level object: it
//! never owns its target. Resolution goes through an injected
//! [`ObjectCatalog`], which may be backed by a package reader, a database or
//! the in-memory [`InMemoryCatalog`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::{alpha1, char, digit1, space0},
    combinator::{all_consuming, map},
    multi::many0,
    sequence::{delimited, preceded, separated_pair, terminated, tuple},
    IResult,
};
use rustc_hash::FxHashMap;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parsed EnergyML content type.
///
/// Accepts both the MIME form used by RESQML 2.0
/// (`application/x-resqml+xml;version=2.0;type=obj_IjkGridRepresentation`)
/// and the qualified form used by RESQML 2.2 (`resqml22.IjkGridRepresentation`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct ContentType {
    domain: String,
    version: String,
    object_type: String,
}

impl ContentType {
    pub fn new(domain: &str, version: &str, object_type: &str) -> Self {
        Self {
            domain: domain.to_ascii_lowercase(),
            version: version.to_string(),
            object_type: object_type
                .strip_prefix("obj_")
                .unwrap_or(object_type)
                .to_string(),
        }
    }

    /// Parses either content-type form.
    pub fn parse(text: &str) -> Result<Self> {
        match all_consuming(alt((mime_form, qualified_form)))(text.trim()) {
            Ok((_, ct)) => Ok(ct),
            Err(_) => Err(Error::unsupported("content type", text)),
        }
    }

    /// Standards domain, e.g. `resqml` or `eml`.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Schema version, e.g. `2.0`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Object type without the legacy `obj_` prefix.
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Qualified type, e.g. `resqml22.IjkGridRepresentation`.
    pub fn qualified_type(&self) -> String {
        let digits: String = self.version.chars().filter(|c| c.is_ascii_digit()).collect();
        format!("{}{}.{}", self.domain, digits, self.object_type)
    }

    /// Two content types designate the same kind of object when domain and
    /// object type agree. Versions are not compared.
    pub fn is_compatible_with(&self, other: &ContentType) -> bool {
        self.domain == other.domain && self.object_type == other.object_type
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "application/x-{}+xml;version={};type={}",
            self.domain, self.version, self.object_type
        )
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ContentType> for String {
    fn from(ct: ContentType) -> Self {
        ct.to_string()
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn mime_parameter(input: &str) -> IResult<&str, (&str, &str)> {
    preceded(
        tuple((space0, char(';'), space0)),
        separated_pair(
            alpha1,
            delimited(space0, char('='), space0),
            terminated(take_till1(|c: char| c == ';' || c.is_whitespace()), space0),
        ),
    )(input)
}

fn mime_form(input: &str) -> IResult<&str, ContentType> {
    let (rest, (domain, params)) = tuple((
        delimited(
            tag("application/x-"),
            take_while1(|c: char| c.is_ascii_alphanumeric()),
            tag("+xml"),
        ),
        many0(mime_parameter),
    ))(input)?;

    let mut version = None;
    let mut object_type = None;
    for (key, value) in params {
        match key {
            "version" => version = Some(value),
            "type" => object_type = Some(value),
            _ => {}
        }
    }

    match (version, object_type) {
        (Some(v), Some(t)) => Ok((rest, ContentType::new(domain, v, t))),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

fn qualified_form(input: &str) -> IResult<&str, ContentType> {
    map(
        tuple((alpha1, digit1, char('.'), take_while1(is_token_char))),
        |(domain, digits, _, object_type): (&str, &str, char, &str)| {
            let version = match digits.len() {
                1 => digits.to_string(),
                _ => format!("{}.{}", &digits[..1], &digits[1..]),
            };
            ContentType::new(domain, &version, object_type)
        },
    )(input)
}

/// Weak reference to another top-level data object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataObjectReference {
    pub uuid: Uuid,
    pub content_type: ContentType,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub version: Option<String>,
}

impl DataObjectReference {
    pub fn new(uuid: Uuid, content_type: ContentType) -> Self {
        Self {
            uuid,
            content_type,
            title: None,
            version: None,
        }
    }

    /// Builds a reference from its textual parts.
    pub fn parse(uuid: &str, content_type: &str) -> Result<Self> {
        let uuid = Uuid::parse_str(uuid.trim())
            .map_err(|e| Error::structural("data object reference", e.to_string()))?;
        Ok(Self::new(uuid, ContentType::parse(content_type)?))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Resolves the reference through a catalog, using the declared content
    /// type as the hint.
    pub fn resolve<H, C>(&self, catalog: &C) -> Result<Arc<H>>
    where
        H: ?Sized,
        C: ObjectCatalog<H> + ?Sized,
    {
        catalog.resolve_reference(&self.uuid, Some(&self.content_type))
    }
}

impl fmt::Display for DataObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.uuid, self.content_type.qualified_type())
    }
}

/// Resolves UUIDs to object handles.
///
/// Implementations must be safe to call from many readers at once.
pub trait ObjectCatalog<H: ?Sized>: Send + Sync {
    fn resolve_reference(
        &self,
        uuid: &Uuid,
        content_type_hint: Option<&ContentType>,
    ) -> Result<Arc<H>>;
}

/// Catalog backed by a hash map, filled once and then shared read-only.
pub struct InMemoryCatalog<H: ?Sized> {
    entries: FxHashMap<Uuid, (ContentType, Arc<H>)>,
}

impl<H: ?Sized> InMemoryCatalog<H> {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Registers an object, replacing any previous entry with the same UUID.
    pub fn insert(&mut self, uuid: Uuid, content_type: ContentType, handle: Arc<H>) {
        self.entries.insert(uuid, (content_type, handle));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: ?Sized> Default for InMemoryCatalog<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized + Send + Sync> ObjectCatalog<H> for InMemoryCatalog<H> {
    fn resolve_reference(
        &self,
        uuid: &Uuid,
        content_type_hint: Option<&ContentType>,
    ) -> Result<Arc<H>> {
        tracing::trace!(%uuid, "catalog lookup");
        let (content_type, handle) = self
            .entries
            .get(uuid)
            .ok_or_else(|| Error::unresolved(uuid.to_string(), "not present in catalog"))?;

        if let Some(hint) = content_type_hint {
            if !hint.is_compatible_with(content_type) {
                return Err(Error::unresolved(
                    uuid.to_string(),
                    format!(
                        "catalog holds {} but {} was expected",
                        content_type.qualified_type(),
                        hint.qualified_type()
                    ),
                ));
            }
        }

        Ok(Arc::clone(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID_UUID: &str = "2f8b5d0e-9c1a-4b7e-8f3d-6a2c1e4b9d70";

    #[test]
    fn parse_mime_form() {
        let ct = ContentType::parse(
            "application/x-resqml+xml;version=2.0;type=obj_IjkGridRepresentation",
        )
        .unwrap();
        assert_eq!(ct.domain(), "resqml");
        assert_eq!(ct.version(), "2.0");
        assert_eq!(ct.object_type(), "IjkGridRepresentation");
        assert_eq!(ct.qualified_type(), "resqml20.IjkGridRepresentation");
    }

    #[test]
    fn parse_mime_form_with_spaces_and_reordered_parameters() {
        let ct = ContentType::parse(
            "application/x-eml+xml; type=obj_EpcExternalPartReference; version=2.0",
        )
        .unwrap();
        assert_eq!(ct.domain(), "eml");
        assert_eq!(ct.object_type(), "EpcExternalPartReference");
    }

    #[test]
    fn parse_qualified_form() {
        let ct = ContentType::parse("resqml22.UnstructuredGridRepresentation").unwrap();
        assert_eq!(ct.version(), "2.2");
        assert_eq!(ct.object_type(), "UnstructuredGridRepresentation");
        let mime = ContentType::parse(&ct.to_string()).unwrap();
        assert_eq!(mime, ct);
    }

    #[test]
    fn reject_garbage() {
        assert!(matches!(
            ContentType::parse("text/plain"),
            Err(Error::UnsupportedVariant { .. })
        ));
        assert!(ContentType::parse("application/x-resqml+xml;version=2.0").is_err());
    }

    #[test]
    fn catalog_resolution() {
        let reference = DataObjectReference::parse(
            GRID_UUID,
            "application/x-resqml+xml;version=2.0;type=obj_IjkGridRepresentation",
        )
        .unwrap();

        let mut catalog: InMemoryCatalog<str> = InMemoryCatalog::new();
        assert!(reference.resolve(&catalog).unwrap_err().is_recoverable());

        catalog.insert(
            reference.uuid,
            ContentType::parse("resqml22.IjkGridRepresentation").unwrap(),
            Arc::from("grid"),
        );
        assert_eq!(&*reference.resolve(&catalog).unwrap(), "grid");
    }

    #[test]
    fn catalog_rejects_incompatible_hint() {
        let uuid = Uuid::parse_str(GRID_UUID).unwrap();
        let mut catalog: InMemoryCatalog<str> = InMemoryCatalog::new();
        catalog.insert(
            uuid,
            ContentType::parse("resqml22.IjkGridRepresentation").unwrap(),
            Arc::from("grid"),
        );

        let hint = ContentType::parse("resqml22.WellboreTrajectoryRepresentation").unwrap();
        let err = catalog.resolve_reference(&uuid, Some(&hint)).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
        assert!(catalog.resolve_reference(&uuid, None).is_ok());
    }
}
