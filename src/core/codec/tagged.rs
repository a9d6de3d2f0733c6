//! Tagged Dialect
//!
//! An XML rendering of the build record meant for diffing and for feeding
//! the calculation engine. Layout:
//!
//! ```xml
//! <BuildRecord version="1">
//!   <Build name="..." budget="15" targetLevel="90" goal="boss_killing">
//!     <Description>...</Description>
//!   </Build>
//!   <Character class="ranger" ascendancy="deadeye" level="90"/>
//!   <Skills>
//!     <Skill slot="Weapon 1">
//!       <Gem name="Lightning Arrow" level="20" quality="20" support="false"/>
//!     </Skill>
//!   </Skills>
//!   <Items>
//!     <Item slot="main_hand" name="..." type="..." rarity="rare">affix lines</Item>
//!   </Items>
//!   <Tree classId="2" ascendancy="Deadeye" nodes="1,2,3">
//!     <Mastery node="5" effect="7"/>
//!   </Tree>
//!   <Config>
//!     <Input name="enemyLevel" number="84"/>
//!   </Config>
//! </BuildRecord>
//! ```
//!
//! Each of the six second-level regions is optional on decode; a missing
//! region decodes to its default.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{json, Map, Value};

use super::normalize::{normalize, NormalizedRecord};
use super::{check_version, CodecError, Result};
use crate::core::build::{BuildRecord, ConfigValue};

const ROOT: &str = "BuildRecord";

// ============================================================================
// Encoding
// ============================================================================

type XmlWriter = Writer<Vec<u8>>;

fn emit<'a>(writer: &mut XmlWriter, event: Event<'a>) -> Result<()> {
    writer.write_event(event).map_err(CodecError::serialization)
}

fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for attr in attrs {
        start.push_attribute(*attr);
    }
    start
}

/// Write `<name attrs>text</name>`, or a self-closing tag when `text` is
/// empty so no indentation whitespace leaks into the content.
fn text_element(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
    if text.is_empty() {
        return emit(writer, Event::Empty(element(name, attrs)));
    }
    emit(writer, Event::Start(element(name, attrs)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

/// Render a record in the tagged dialect.
pub fn encode_tagged(record: &BuildRecord) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let w = &mut writer;

    emit(w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(w, Event::Start(element(ROOT, &[("version", record.version.as_str())])))?;

    // Build-level attributes
    let meta = &record.metadata;
    let budget = meta.budget.to_string();
    let target_level = meta.target_level.to_string();
    emit(
        w,
        Event::Start(element(
            "Build",
            &[
                ("name", meta.name.as_str()),
                ("budget", budget.as_str()),
                ("targetLevel", target_level.as_str()),
                ("goal", meta.build_goal.id()),
            ],
        )),
    )?;
    text_element(w, "Description", &[], &meta.description)?;
    emit(w, Event::End(BytesEnd::new("Build")))?;

    // Character
    let level = record.character.level.to_string();
    let mut character = vec![("class", record.character.class.id()), ("level", level.as_str())];
    if let Some(ascendancy) = record.character.ascendancy {
        character.push(("ascendancy", ascendancy.id()));
    }
    emit(w, Event::Empty(element("Character", &character)))?;

    // Skills
    emit(w, Event::Start(BytesStart::new("Skills")))?;
    for group in &record.skill_setup {
        emit(w, Event::Start(element("Skill", &[("slot", group.slot.as_str())])))?;
        for gem in std::iter::once(&group.main_skill).chain(group.supports.iter()) {
            let level = gem.level.to_string();
            let quality = gem.quality.to_string();
            let support = if gem.support { "true" } else { "false" };
            emit(
                w,
                Event::Empty(element(
                    "Gem",
                    &[
                        ("name", gem.name.as_str()),
                        ("level", level.as_str()),
                        ("quality", quality.as_str()),
                        ("support", support),
                    ],
                )),
            )?;
        }
        emit(w, Event::End(BytesEnd::new("Skill")))?;
    }
    emit(w, Event::End(BytesEnd::new("Skills")))?;

    // Items
    emit(w, Event::Start(BytesStart::new("Items")))?;
    for (slot, item) in &record.items {
        text_element(
            w,
            "Item",
            &[
                ("slot", slot.id()),
                ("name", item.name.as_str()),
                ("type", item.base_type.as_str()),
                ("rarity", item.rarity.id()),
            ],
            &item.affixes,
        )?;
    }
    emit(w, Event::End(BytesEnd::new("Items")))?;

    // Passive tree
    let tree = &record.passive_tree;
    let class_id = tree.class_id.to_string();
    let nodes = tree
        .allocated_nodes
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    emit(
        w,
        Event::Start(element(
            "Tree",
            &[
                ("classId", class_id.as_str()),
                ("ascendancy", tree.ascendancy_name.as_str()),
                ("nodes", nodes.as_str()),
            ],
        )),
    )?;
    for (node, effect) in &tree.mastery_effects {
        let node = node.to_string();
        let effect = effect.to_string();
        emit(
            w,
            Event::Empty(element("Mastery", &[("node", node.as_str()), ("effect", effect.as_str())])),
        )?;
    }
    emit(w, Event::End(BytesEnd::new("Tree")))?;

    // Config
    emit(w, Event::Start(BytesStart::new("Config")))?;
    for (name, value) in &record.config_flags {
        let (kind, rendered) = match value {
            ConfigValue::Bool(b) => ("boolean", b.to_string()),
            ConfigValue::Number(n) => ("number", n.to_string()),
        };
        emit(
            w,
            Event::Empty(element("Input", &[("name", name.as_str()), (kind, rendered.as_str())])),
        )?;
    }
    emit(w, Event::End(BytesEnd::new("Config")))?;

    emit(w, Event::End(BytesEnd::new(ROOT)))?;

    String::from_utf8(writer.into_inner()).map_err(CodecError::serialization)
}

// ============================================================================
// Decoding
// ============================================================================

/// Minimal element tree built from the reader's event stream.
#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| CodecError::malformed(format!("bad attribute in <{name}>: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| CodecError::malformed(format!("bad attribute value in <{name}>: {e}")))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            ..Self::default()
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name.eq_ignore_ascii_case(name))
    }
}

fn parse_tree(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            CodecError::malformed(format!("XML error at position {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => stack.push(Node::from_start(&start)?),
            Event::Empty(start) => {
                let node = Node::from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| CodecError::malformed(format!("bad text content: {e}")))?;
                    current.text.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                let Some(node) = stack.pop() else {
                    return Err(CodecError::malformed("unbalanced closing tag"));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::Eof => break,
            _ => {}
        }
        if root.is_some() && stack.is_empty() {
            break;
        }
    }

    if !stack.is_empty() {
        return Err(CodecError::malformed("unexpected end of document"));
    }
    root.ok_or_else(|| CodecError::malformed("document has no root element"))
}

/// Map the element tree onto the loose structure accepted by `normalize`.
fn tree_to_value(root: &Node) -> Value {
    let mut out = Map::new();

    if let Some(version) = root.attr("version") {
        out.insert("version".into(), json!(version));
    }

    if let Some(build) = root.child("Build") {
        let mut meta = Map::new();
        for (attr, key) in [
            ("name", "name"),
            ("budget", "budget"),
            ("targetLevel", "target_level"),
            ("goal", "build_goal"),
        ] {
            if let Some(v) = build.attr(attr) {
                meta.insert(key.into(), json!(v));
            }
        }
        if let Some(description) = build.child("Description") {
            meta.insert("description".into(), json!(description.text));
        }
        out.insert("metadata".into(), Value::Object(meta));
    }

    if let Some(character) = root.child("Character") {
        let mut section = Map::new();
        for key in ["class", "ascendancy", "level"] {
            if let Some(v) = character.attr(key) {
                section.insert(key.into(), json!(v));
            }
        }
        out.insert("character".into(), Value::Object(section));
    }

    if let Some(skills) = root.child("Skills") {
        let groups: Vec<Value> = skills
            .children_named("Skill")
            .map(|skill| {
                let gems: Vec<Value> = skill
                    .children_named("Gem")
                    .map(|gem| {
                        json!({
                            "name": gem.attr("name"),
                            "level": gem.attr("level"),
                            "quality": gem.attr("quality"),
                            "support": gem.attr("support").unwrap_or("false"),
                        })
                    })
                    .collect();
                json!({ "slot": skill.attr("slot"), "gems": gems })
            })
            .collect();
        out.insert("skill_setup".into(), Value::Array(groups));
    }

    if let Some(items) = root.child("Items") {
        let list: Vec<Value> = items
            .children_named("Item")
            .map(|item| {
                json!({
                    "slot": item.attr("slot"),
                    "name": item.attr("name"),
                    "type": item.attr("type"),
                    "rarity": item.attr("rarity"),
                    "affixes": item.text,
                })
            })
            .collect();
        out.insert("items".into(), Value::Array(list));
    }

    if let Some(tree) = root.child("Tree") {
        let mut section = Map::new();
        if let Some(v) = tree.attr("classId") {
            section.insert("class_id".into(), json!(v));
        }
        if let Some(v) = tree.attr("ascendancy") {
            section.insert("ascendancy_name".into(), json!(v));
        }
        if let Some(v) = tree.attr("nodes") {
            section.insert("allocated_nodes".into(), json!(v));
        }
        let masteries: Vec<Value> = tree
            .children_named("Mastery")
            .map(|m| json!({ "node": m.attr("node"), "effect": m.attr("effect") }))
            .collect();
        section.insert("mastery_effects".into(), Value::Array(masteries));
        out.insert("passive_tree".into(), Value::Object(section));
    }

    if let Some(config) = root.child("Config") {
        let mut flags = Map::new();
        for input in config.children_named("Input") {
            let Some(name) = input.attr("name") else { continue };
            let value = input
                .attr("boolean")
                .or_else(|| input.attr("number"))
                .or_else(|| input.attr("value"));
            if let Some(v) = value {
                flags.insert(name.to_string(), json!(v));
            }
        }
        out.insert("config_flags".into(), Value::Object(flags));
    }

    Value::Object(out)
}

/// Decode a tagged document into a record.
pub fn decode_tagged(xml: &str) -> Result<BuildRecord> {
    decode_tagged_normalized(xml).map(|n| n.record)
}

/// Decode a tagged document, keeping the normalization warnings.
pub fn decode_tagged_normalized(xml: &str) -> Result<NormalizedRecord> {
    let root = parse_tree(xml)?;
    if let Some(version) = root.attr("version") {
        check_version(version)?;
    }
    Ok(normalize(&tree_to_value(&root)))
}
