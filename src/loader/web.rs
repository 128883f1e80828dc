use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use super::ScriptInjector;
use crate::error::{SocialLoginError, SocialLoginResult};
use crate::types::Provider;

/// Injects vendor SDK `<script>` tags into the current document.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomScriptInjector;

fn script_load_error(provider: Provider, message: impl Into<String>) -> SocialLoginError {
    SocialLoginError::ScriptLoad {
        provider,
        message: message.into(),
    }
}

#[async_trait::async_trait(?Send)]
impl ScriptInjector for DomScriptInjector {
    async fn inject(&self, provider: Provider, url: &str) -> SocialLoginResult<()> {
        let window = web_sys::window().ok_or_else(|| script_load_error(provider, "Window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| script_load_error(provider, "Document not available"))?;

        let script = document
            .create_element("script")
            .map_err(|err| script_load_error(provider, format!("Failed to create script: {err:?}")))?
            .dyn_into::<web_sys::HtmlScriptElement>()
            .map_err(|_| script_load_error(provider, "Script element has wrong type"))?;
        script.set_src(url);
        script.set_r#async(true);
        if provider == Provider::Facebook {
            script.set_defer(true);
        }

        let (sender, receiver) = oneshot::channel::<Result<(), SocialLoginError>>();
        let sender = Rc::new(RefCell::new(Some(sender)));

        let success_sender = sender.clone();
        let onload = Closure::wrap(Box::new(move || {
            if let Some(tx) = success_sender.borrow_mut().take() {
                let _ = tx.send(Ok(()));
            }
        }) as Box<dyn FnMut()>);

        let error_sender = sender.clone();
        let url_string = url.to_string();
        let onerror = Closure::wrap(Box::new(move || {
            if let Some(tx) = error_sender.borrow_mut().take() {
                let _ = tx.send(Err(script_load_error(
                    provider,
                    format!("failed to fetch {url_string}"),
                )));
            }
        }) as Box<dyn FnMut()>);

        script.set_onload(Some(onload.as_ref().unchecked_ref()));
        script.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        onload.forget();
        onerror.forget();

        if let Some(body) = document.body() {
            body.append_child(&script)
                .map_err(|err| script_load_error(provider, format!("Failed to append script to <body>: {err:?}")))?;
        } else if let Some(head) = document.head() {
            head.append_child(&script)
                .map_err(|err| script_load_error(provider, format!("Failed to append script to <head>: {err:?}")))?;
        } else {
            return Err(script_load_error(provider, "No <body> or <head> element found"));
        }

        receiver
            .await
            .map_err(|_| script_load_error(provider, "Script loading channel dropped"))?
    }
}
