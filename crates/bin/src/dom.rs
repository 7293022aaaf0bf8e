//! A tiny styled element tree used by the demo commands.
//!
//! Every element carries a `style` dict. Text elements add a `text` string, and a list builds
//! three text children of its own.

use objectsync::{AttributeType, BuildContext, ObjectId, ObjectType, Result, Server, Value};

/// Base of every element: a `style` dict.
fn add_style(ctx: &mut BuildContext<'_>) -> Result<()> {
    let style = ctx.add_attribute("style", AttributeType::Map, None)?;
    ctx.bind_attribute("style", &style)
}

#[derive(Debug, Default)]
pub struct Div;

impl ObjectType for Div {
    fn type_name() -> &'static str {
        "DivObject"
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        add_style(ctx)
    }
}

/// Text element. Accepts `{"text": "..."}` as build arguments.
#[derive(Debug, Default)]
pub struct Text;

impl ObjectType for Text {
    fn type_name() -> &'static str {
        "TextObject"
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        add_style(ctx)?;
        let init = ctx.arg("text").cloned();
        ctx.add_attribute("text", AttributeType::String, init)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct List;

impl ObjectType for List {
    fn type_name() -> &'static str {
        "ListObject"
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        add_style(ctx)?;
        ctx.add_attribute("items", AttributeType::Set, None)?;
        for (field, text) in [("first", "Hello"), ("second", "World"), ("third", "wyrwerywerywyr")] {
            let child = ctx.add_child_of::<Text>(Value::map([("text", text)]))?;
            ctx.bind_child(field, &child)?;
        }
        Ok(())
    }
}

/// Ids of the objects the scene creates under the root.
#[derive(Debug, Clone)]
pub struct Scene {
    pub div: ObjectId,
    pub text: ObjectId,
    pub list: ObjectId,
}

impl Scene {
    /// Resolve a demo object name (`root`, `div`, `text`, `list`) or a raw id.
    pub fn resolve(&self, name: &str) -> ObjectId {
        match name {
            "div" => self.div.clone(),
            "text" => self.text.clone(),
            "list" => self.list.clone(),
            other => ObjectId::new(other),
        }
    }
}

pub fn register(server: &mut Server) -> Result<()> {
    server.register::<Div>()?;
    server.register::<Text>()?;
    server.register::<List>()?;
    Ok(())
}

/// Build the scene: a div, a text and a list, then style them.
///
/// The list is created and styled inside one recording, so a single undo removes it.
pub fn populate(server: &mut Server) -> Result<Scene> {
    let root = ObjectId::root();
    let div = server.create_object(Div::type_name(), &root)?;
    let text = server.create_object(Text::type_name(), &root)?;

    let mut recording = server.record();
    let list = recording.create_object(List::type_name(), &root)?;
    let list_style = recording.get_attribute(&list, "style")?;
    list_style.add(&mut recording, "background-color", "green")?;
    recording.finish()?;

    server
        .get_attribute(&text, "text")?
        .set(server, "Hello ObjectSync!")?;
    let text_style = server.get_attribute(&text, "style")?;
    for (key, value) in [
        ("font-size", "30px"),
        ("border", "5px solid black"),
        ("background-color", "yellow"),
    ] {
        text_style.add(server, key, value)?;
    }
    server
        .get_attribute(&div, "style")?
        .add(server, "background-color", "blue")?;

    Ok(Scene { div, text, list })
}
