use tracing::trace;

use worksync_core::{ClassDecl, DocumentState, COMPONENT_MARKER_TYPE};

/// Generated output of a legacy view template.
const TEMPLATE_GENERATED_SUFFIX: &str = ".view.g.cs";
/// Generated output of a component.
const COMPONENT_GENERATED_SUFFIX: &str = ".component.g.cs";
/// Background-generated virtual source backing an open component.
const BACKGROUND_VIRTUAL_SUFFIX: &str = ".component.virtual.cs";
/// Ordinary host-language source; only component fragments matter.
const HOST_SOURCE_SUFFIX: &str = ".cs";

/// Decides whether a document event can affect project state at all.
/// Generated template/component/virtual sources always do; an arbitrary host
/// source file only does when it declares a partial component class.
pub fn is_relevant_document(document: &DocumentState) -> bool {
    let path = document.file_path.as_str();
    if path.ends_with(TEMPLATE_GENERATED_SUFFIX)
        || path.ends_with(COMPONENT_GENERATED_SUFFIX)
        || path.ends_with(BACKGROUND_VIRTUAL_SUFFIX)
    {
        return true;
    }
    if path.ends_with(HOST_SOURCE_SUFFIX) {
        return is_partial_component_class(document);
    }
    false
}

/// True when any class declared in the document (top-level or nested) is a
/// partial class whose base-or-interface list resolves to the component
/// marker symbol.
///
/// Deliberately conservative: without a syntax tree or a semantic model the
/// answer is `false` rather than forcing expensive analysis synchronously,
/// and resolution failures also answer `false`. The comparison is by symbol
/// identity, never by the written type name.
pub fn is_partial_component_class(document: &DocumentState) -> bool {
    let Some(syntax) = document.syntax() else {
        trace!(path = %document.file_path, "no syntax tree yet; treating as irrelevant");
        return false;
    };
    let Some(semantics) = document.semantics() else {
        trace!(path = %document.file_path, "no semantic model yet; treating as irrelevant");
        return false;
    };
    let Some(marker) = semantics.well_known_type(COMPONENT_MARKER_TYPE) else {
        return false;
    };

    let mut stack: Vec<&ClassDecl> = syntax.classes().iter().collect();
    while let Some(class) = stack.pop() {
        stack.extend(class.nested.iter());
        if !class.is_partial {
            continue;
        }
        if class
            .bases
            .iter()
            .any(|base| semantics.resolve(base) == Some(marker))
        {
            return true;
        }
    }
    false
}
