//! Page handlers for serving HTML shells
//!
//! Shells are static markup; the script in each page calls the JSON API for
//! its data, so permission gating happens there.

use crate::{error::WebResult, extractors::OptionalSessionUser};
use almacen_core::EntityKind;
use axum::{
    extract::Path,
    response::{Html, IntoResponse, Redirect, Response},
};

const INDEX: &str = include_str!("../../templates/index.html");
const LOGIN: &str = include_str!("../../templates/login.html");
const ENTITY: &str = include_str!("../../templates/entity.html");

fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |page, (key, value)| {
        page.replace(&format!("{{{{{key}}}}}"), value)
    })
}

/// Dashboard
pub async fn dashboard(OptionalSessionUser(session): OptionalSessionUser) -> Response {
    if session.is_none() {
        return Redirect::to("/login").into_response();
    }
    Html(INDEX).into_response()
}

/// Login form
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN)
}

/// List page shell of one collection
pub async fn entity_page(
    OptionalSessionUser(session): OptionalSessionUser,
    Path(slug): Path<String>,
) -> WebResult<Response> {
    let kind: EntityKind = slug.parse()?;
    if session.is_none() {
        return Ok(Redirect::to("/login").into_response());
    }

    Ok(Html(render(
        ENTITY,
        &[("slug", kind.slug()), ("label", kind.label())],
    ))
    .into_response())
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_every_occurrence() {
        let page = render("<h1>{{label}}</h1><div data-slug=\"{{slug}}\">{{label}}</div>", &[
            ("slug", "areas"),
            ("label", "Áreas"),
        ]);
        assert_eq!(page, "<h1>Áreas</h1><div data-slug=\"areas\">Áreas</div>");
    }

    #[test]
    fn test_entity_template_has_placeholders() {
        assert!(ENTITY.contains("{{slug}}"));
        assert!(ENTITY.contains("{{label}}"));
    }
}
