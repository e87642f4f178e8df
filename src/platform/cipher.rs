//! Signature cipher recovery for scrambled stream tokens
//!
//! The host ships the descrambling routine inside its companion script and
//! changes it without notice. Instead of re-implementing it, we locate the
//! routine by shape, cut it out together with the helper object it calls,
//! and hand the assembled program to a [`ScriptEvaluator`].

use crate::error::VidmapError;
use crate::platform::evaluator::ScriptEvaluator;
use crate::platform::extract::extract_js_block;
use regex::Regex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, info, warn};

/// Shortest output accepted as a signature
pub const MIN_SIGNATURE_LEN: usize = 10;

/// Name of the wrapper function in assembled programs
pub const DECIPHER_WRAPPER: &str = "vidmapDecipher";

/// A function `p` whose first statement is `p=p.split("")`
const CANDIDATE_PATTERN: &str = r#"(?s)(?:function\s+[A-Za-z0-9_$]+|[A-Za-z0-9_$]+\s*=\s*function)\s*\(\s*([A-Za-z0-9_$]+)\s*\)\s*\{\s*([A-Za-z0-9_$]+)\s*=\s*([A-Za-z0-9_$]+)\.split\(\s*(?:""|'')\s*\)\s*;(.*?)\}"#;

/// A two-character identifier used as an object
const HELPER_REF_PATTERN: &str = r#"(?:^|[^A-Za-z0-9_$.])([A-Za-z0-9_$]{2})\."#;

/// Turns a scrambled token into a signature using companion script text
pub trait SignatureResolver {
    /// Resolve `scrambled` into a signature with the cipher found in `script`
    fn resolve(&mut self, scrambled: &str, script: &str) -> Result<String, VidmapError>;

    /// Forget anything derived from previously seen scripts
    fn reset(&mut self) {}
}

/// One candidate descrambling routine recovered from a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherProgram {
    param: String,
    body: String,
    helper: Option<String>,
}

impl CipherProgram {
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Statements after the initial split
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Helper object definition, if the body uses one
    pub fn helper(&self) -> Option<&str> {
        self.helper.as_deref()
    }

    /// Build a self-contained program whose completion value is the
    /// descrambled form of `token`
    pub fn assemble(&self, token: &str) -> Result<String, VidmapError> {
        let literal = serde_json::to_string(token)
            .map_err(|e| VidmapError::CipherError(format!("cannot quote token: {}", e)))?;

        let mut program = String::new();
        if let Some(helper) = &self.helper {
            program.push_str(helper);
            program.push('\n');
        }
        program.push_str(&format!(
            "function {wrapper}({p}){{{p}={p}.split(\"\");{body}}}\n{wrapper}({literal});\n",
            wrapper = DECIPHER_WRAPPER,
            p = self.param,
            body = self.body,
            literal = literal,
        ));
        Ok(program)
    }
}

/// Find every candidate routine in `script`, in discovery order.
///
/// Candidates whose helper object cannot be located are skipped.
pub fn discover(script: &str) -> Result<Vec<CipherProgram>, VidmapError> {
    let candidate_regex = Regex::new(CANDIDATE_PATTERN)?;
    let helper_ref_regex = Regex::new(HELPER_REF_PATTERN)?;
    let mut programs = Vec::new();

    for captures in candidate_regex.captures_iter(script) {
        let (Some(param), Some(target), Some(source), Some(body)) = (
            captures.get(1),
            captures.get(2),
            captures.get(3),
            captures.get(4),
        ) else {
            continue;
        };
        let param = param.as_str();
        if target.as_str() != param || source.as_str() != param {
            continue;
        }
        let body = body.as_str();

        let helper_name = helper_ref_regex
            .captures_iter(body)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .find(|name| *name != param);

        let helper = match helper_name {
            Some(name) => match find_helper(script, name)? {
                Some(definition) => Some(definition),
                None => {
                    debug!("Helper object {} not found, skipping candidate", name);
                    continue;
                }
            },
            None => None,
        };

        programs.push(CipherProgram {
            param: param.to_string(),
            body: body.to_string(),
            helper,
        });
    }

    debug!("Discovered {} cipher candidates", programs.len());
    Ok(programs)
}

/// Locate `var <name>={...};` and return it as a standalone statement
fn find_helper(script: &str, name: &str) -> Result<Option<String>, VidmapError> {
    let definition_regex = Regex::new(&format!(
        r"\b(?:var|let|const)\s+{}\s*=\s*\{{",
        regex::escape(name)
    ))?;

    for found in definition_regex.find_iter(script) {
        // Everything up to the '{' is the marker for the balanced scan
        let marker = &found.as_str()[..found.as_str().len() - 1];
        if let Ok(object) = extract_js_block(&script[found.start()..], marker) {
            return Ok(Some(format!("var {}={};", name, object)));
        }
    }
    Ok(None)
}

struct DiscoveredScript {
    fingerprint: u64,
    programs: Vec<CipherProgram>,
    /// Candidate that produced the last accepted signature
    preferred: Option<usize>,
}

/// Default resolver: heuristic discovery plus an injected evaluator
pub struct JsCipher<E> {
    evaluator: E,
    min_signature_len: usize,
    cache: Option<DiscoveredScript>,
}

impl<E: ScriptEvaluator> JsCipher<E> {
    /// Create a new resolver around `evaluator`
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            min_signature_len: MIN_SIGNATURE_LEN,
            cache: None,
        }
    }

    /// Set the shortest output accepted as a signature
    pub fn with_min_signature_len(mut self, len: usize) -> Self {
        self.min_signature_len = len;
        self
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Candidates cached for the last script, if any
    pub fn cached_programs(&self) -> Option<&[CipherProgram]> {
        self.cache.as_ref().map(|c| c.programs.as_slice())
    }
}

/// Discovered candidates for `script`, rediscovering if the script changed
fn load_programs<'a>(
    cache: &'a mut Option<DiscoveredScript>,
    script: &str,
) -> Result<&'a mut DiscoveredScript, VidmapError> {
    let fingerprint = fingerprint(script);
    let stale = cache
        .as_ref()
        .map_or(true, |cached| cached.fingerprint != fingerprint);

    if stale {
        info!("Discovering cipher in companion script ({} chars)", script.len());
        return Ok(cache.insert(DiscoveredScript {
            fingerprint,
            programs: discover(script)?,
            preferred: None,
        }));
    }

    cache
        .as_mut()
        .ok_or_else(|| VidmapError::CipherError("cipher cache unavailable".to_string()))
}

impl<E: ScriptEvaluator> SignatureResolver for JsCipher<E> {
    fn resolve(&mut self, scrambled: &str, script: &str) -> Result<String, VidmapError> {
        let Self {
            evaluator,
            min_signature_len,
            cache,
        } = self;
        let discovered = load_programs(cache, script)?;

        if discovered.programs.is_empty() {
            return Err(VidmapError::CipherError(
                "no descrambling function found in companion script".to_string(),
            ));
        }

        let preferred = discovered.preferred;
        let order: Vec<usize> = preferred
            .into_iter()
            .chain((0..discovered.programs.len()).filter(|i| Some(*i) != preferred))
            .collect();

        let mut last_problem = String::from("no plausible output");
        for index in order {
            let program = discovered.programs[index].assemble(scrambled)?;
            match evaluator.evaluate(&program) {
                Ok(output) if output.chars().count() >= *min_signature_len => {
                    debug!("Cipher candidate {} accepted", index);
                    discovered.preferred = Some(index);
                    return Ok(output);
                }
                Ok(output) => {
                    debug!(
                        "Cipher candidate {} rejected: output too short ({} chars)",
                        index,
                        output.chars().count()
                    );
                    last_problem = format!("candidate {} produced {:?}", index, output);
                }
                Err(e) => {
                    debug!("Cipher candidate {} failed: {}", index, e);
                    last_problem = format!("candidate {} failed: {}", index, e);
                }
            }
        }

        warn!("No cipher candidate produced a plausible signature");
        Err(VidmapError::CipherError(format!(
            "could not descramble signature, the host may have changed its cipher ({})",
            last_problem
        )))
    }

    fn reset(&mut self) {
        self.cache = None;
    }
}

fn fingerprint(script: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    script.hash(&mut hasher);
    hasher.finish()
}
