// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::measurements::{SectionType, TcbInfoMeasurement};
use multimap::MultiMap;
use serde::Deserialize;

/// One expected measurement
#[serde_with::serde_as]
#[derive(Clone, Deserialize, Debug)]
struct RimMeasurement {
    #[serde(rename(deserialize = "section"))]
    section: SectionType,

    /// (Optional) position within the section.  When given and nonzero, the
    /// reported measurement must carry the same index, which tells apart
    /// several PR regions.
    #[serde(rename(deserialize = "index"))]
    index: Option<u32>,

    /// The golden measurement value
    #[serde_as(as = "serde_with::hex::Hex")]
    #[serde(rename(deserialize = "value"))]
    value: Vec<u8>,
}

/// JSON format for reference integrity manifests
#[derive(Deserialize, Debug)]
struct RimDocument {
    #[serde(rename(deserialize = "rim-version"))]
    #[allow(dead_code)]
    version: Option<String>,

    #[serde(rename(deserialize = "reference-measurements"), default)]
    measurements: Vec<RimMeasurement>,
}

/// The expected measurements of a device, grouped by section
#[derive(Debug, Default, Clone)]
pub struct ReferenceManifest {
    m: MultiMap<SectionType, TcbInfoMeasurement>,
}

impl ReferenceManifest {
    pub fn new() -> Self {
        Default::default()
    }

    /// Parse a manifest from its hex-encoded UTF-8 text form.  Absent or
    /// empty input yields an empty manifest.
    pub fn parse_hex(v: Option<&str>) -> Result<Self, Error> {
        let v = match v.map(str::trim) {
            None | Some("") => return Ok(Self::new()),
            Some(v) => v,
        };

        let raw = hex::decode(v).map_err(|e| Error::ManifestParse(e.to_string()))?;
        let j = String::from_utf8(raw).map_err(|e| Error::ManifestParse(e.to_string()))?;

        Self::parse(&j)
    }

    /// Parse a manifest from its JSON document.  Blank input yields an empty
    /// manifest.
    pub fn parse(j: &str) -> Result<Self, Error> {
        let mut rim = Self::new();

        if j.trim().is_empty() {
            return Ok(rim);
        }

        let doc: RimDocument =
            serde_json::from_str(j).map_err(|e| Error::ManifestParse(e.to_string()))?;

        for m in doc.measurements {
            let index = m.index.unwrap_or_default();
            rim.m
                .insert(m.section, TcbInfoMeasurement::new(m.section, index, m.value));
        }

        tracing::debug!(measurements = rim.len(), "parsed reference manifest");

        Ok(rim)
    }

    pub fn is_empty(&self) -> bool {
        self.m.is_empty()
    }

    /// Number of expected measurements across all sections
    pub fn len(&self) -> usize {
        self.m.iter_all().map(|(_, v)| v.len()).sum()
    }

    /// Sections the manifest has expectations for
    pub fn sections(&self) -> impl Iterator<Item = &SectionType> {
        self.m.keys()
    }

    pub fn expected(&self, section: &SectionType) -> Option<&Vec<TcbInfoMeasurement>> {
        self.m.get_vec(section)
    }

    /// Expected values that do not appear among the `reported` ones.
    ///
    /// Sections absent from the manifest are not checked, and order within a
    /// section is irrelevant.  An expected index of zero matches any reported
    /// index.  An empty result means a match.
    pub fn missing<'a>(&'a self, reported: &[TcbInfoMeasurement]) -> Vec<&'a TcbInfoMeasurement> {
        let mut missing = Vec::new();

        for (section, expected) in self.m.iter_all() {
            let in_section: Vec<&TcbInfoMeasurement> =
                reported.iter().filter(|r| r.section == *section).collect();

            for e in expected {
                let found = in_section
                    .iter()
                    .any(|r| r.value == e.value && (e.index == 0 || r.index == e.index));

                if !found {
                    tracing::warn!(section = ?e.section, index = e.index, value = %hex::encode(&e.value), "expected measurement not reported");
                    missing.push(e);
                }
            }
        }

        missing
    }

    pub fn matches(&self, reported: &[TcbInfoMeasurement]) -> bool {
        self.missing(reported).is_empty()
    }
}
