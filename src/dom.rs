//! Browser document helpers: the drawing canvas and the inspector overlay.

use anyhow::{Context as _, anyhow};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlCanvasElement, HtmlElement};

use crate::scene::SurfaceDesc;

const INSPECTOR_ID: &str = "inspector";

fn document() -> anyhow::Result<Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .context("No document available")
}

fn body(document: &Document) -> anyhow::Result<HtmlElement> {
    document.body().context("The document has no body")
}

fn create<T: JsCast>(document: &Document, tag: &str) -> anyhow::Result<T> {
    document
        .create_element(tag)
        .map_err(|e| anyhow!("Cannot create <{tag}>: {e:?}"))?
        .dyn_into::<T>()
        .map_err(|_| anyhow!("<{tag}> has an unexpected element type"))
}

/// Creates a canvas sized per `desc` and appends it to the body.
///
/// An element with the same id is not reused: calling this twice leaves two
/// canvases in the document.
pub fn create_canvas(desc: &SurfaceDesc) -> anyhow::Result<HtmlCanvasElement> {
    let document = document()?;
    let canvas: HtmlCanvasElement = create(&document, "canvas")?;
    canvas.set_id(&desc.id);
    let style = canvas.style();
    style
        .set_property("width", &desc.width.to_string())
        .and_then(|_| style.set_property("height", &desc.height.to_string()))
        .map_err(|e| anyhow!("Cannot size canvas {:?}: {e:?}", desc.id))?;
    body(&document)?
        .append_child(&canvas)
        .map_err(|e| anyhow!("Cannot attach canvas {:?}: {e:?}", desc.id))?;
    Ok(canvas)
}

/// Shows `text` in a fixed overlay, creating it on first use.
pub fn show_inspector(text: &str) -> anyhow::Result<()> {
    let document = document()?;
    let overlay = match document.get_element_by_id(INSPECTOR_ID) {
        Some(element) => element
            .dyn_into::<HtmlElement>()
            .map_err(|_| anyhow!("#{INSPECTOR_ID} is not an HTML element"))?,
        None => {
            let overlay: HtmlElement = create(&document, "pre")?;
            overlay.set_id(INSPECTOR_ID);
            let style = overlay.style();
            for (key, value) in [
                ("position", "fixed"),
                ("top", "0"),
                ("right", "0"),
                ("margin", "0"),
                ("padding", "8px"),
                ("background", "rgba(0, 0, 0, 0.7)"),
                ("color", "#fff"),
                ("font", "12px monospace"),
            ] {
                style
                    .set_property(key, value)
                    .map_err(|e| anyhow!("Cannot style the inspector: {e:?}"))?;
            }
            body(&document)?
                .append_child(&overlay)
                .map_err(|e| anyhow!("Cannot attach the inspector: {e:?}"))?;
            overlay
        }
    };
    overlay.set_text_content(Some(text));
    overlay
        .style()
        .set_property("display", "block")
        .map_err(|e| anyhow!("Cannot show the inspector: {e:?}"))
}

pub fn hide_inspector() -> anyhow::Result<()> {
    let Some(element) = document()?.get_element_by_id(INSPECTOR_ID) else {
        return Ok(());
    };
    let overlay = element
        .dyn_into::<HtmlElement>()
        .map_err(|_| anyhow!("#{INSPECTOR_ID} is not an HTML element"))?;
    overlay
        .style()
        .set_property("display", "none")
        .map_err(|e| anyhow!("Cannot hide the inspector: {e:?}"))
}
