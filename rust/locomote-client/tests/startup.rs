use anyhow::Result;
use locomote_client::backend::memory::{MemoryContainer, MemoryPage};
use locomote_client::backend::{Container, Registration};
use locomote_client::scheduler::ManualScheduler;
use locomote_client::{Client, ClientError, Message, Settings, Startup};
use pretty_assertions::assert_eq;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_test::wasm_bindgen_test;

const LINK: &str = "locomote-service-worker";

fn client(container: &MemoryContainer) -> Client<MemoryContainer, ManualScheduler> {
    Client::new(container.clone(), ManualScheduler::new(), Settings::default())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_cannot_connect_without_service_workers() {
    let result = Client::<MemoryContainer, ManualScheduler>::connect(
        &MemoryPage::unsupported(),
        ManualScheduler::new(),
        Settings::default(),
    );

    assert!(matches!(result, Err(ClientError::Unsupported)));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
async fn it_reports_missing_support() -> Result<()> {
    let container = MemoryContainer::new();
    let client = client(&container);

    let startup = client.start(&MemoryPage::unsupported()).await;

    assert_eq!(startup, Startup::Unsupported);
    assert_eq!(startup.as_str(), "unsupported");
    assert!(container.scopes().is_empty());
    Ok(())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
async fn it_reports_an_undeclared_worker() -> Result<()> {
    let container = MemoryContainer::new();
    let client = client(&container);
    let page = MemoryPage::new(container.clone())
        .with_link("stylesheet", "/app/style.css")
        .with_meta(LINK, "");

    assert_eq!(client.start(&page).await, Startup::Undeclared);
    assert!(!client.is_ready());
    assert!(container.scopes().is_empty());
    Ok(())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
async fn it_delivers_the_initial_refresh_after_earlier_operations() -> Result<()> {
    let container = MemoryContainer::new();
    let client = client(&container);
    let early = client.post(Message::new("early"));
    let page =
        MemoryPage::new(container.clone()).with_link(format!("preload {LINK}"), "/app/sw.js");

    assert_eq!(client.start(&page).await, Startup::Registered { active: true });
    early.await?;

    let registrations = container.registrations().await?;
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].scope(), "/app/");

    let worker = registrations[0]
        .active()
        .ok_or_else(|| anyhow::anyhow!("registration is not active"))?;
    assert_eq!(worker.script_url(), "/app/sw.js");
    assert_eq!(
        worker.messages(),
        vec![Message::new("early"), Message::refresh("*")]
    );
    Ok(())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
async fn it_registers_the_worker_named_by_a_meta_tag() -> Result<()> {
    let container = MemoryContainer::new();
    let settings = Settings {
        default_origin: "/content".into(),
        ..Settings::default()
    };
    let client = Client::new(container.clone(), ManualScheduler::new(), settings);
    let page =
        MemoryPage::new(container.clone()).with_meta("locomote-service-worker-url", "/sw.js");

    assert_eq!(client.start(&page).await, Startup::Registered { active: true });

    let worker = container.registrations().await?[0]
        .active()
        .ok_or_else(|| anyhow::anyhow!("registration is not active"))?;
    assert_eq!(container.scopes(), vec!["/".to_string()]);
    assert_eq!(worker.messages(), vec![Message::refresh("/content")]);
    Ok(())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
async fn it_skips_the_initial_refresh_when_disabled() -> Result<()> {
    let container = MemoryContainer::new();
    let settings = Settings::from_json(r#"{ "refreshOnStart": false }"#)?;
    let client = Client::new(container.clone(), ManualScheduler::new(), settings);
    let page = MemoryPage::new(container.clone()).with_link(LINK, "/app/sw.js");

    client.start(&page).await;

    let worker = container.registrations().await?[0]
        .active()
        .ok_or_else(|| anyhow::anyhow!("registration is not active"))?;
    assert!(worker.messages().is_empty());
    Ok(())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
async fn it_keeps_operations_queued_while_installing() -> Result<()> {
    let container = MemoryContainer::new();
    container.defer_activation();
    let client = client(&container);
    let page = MemoryPage::new(container.clone()).with_link(LINK, "/app/sw.js");

    let startup = client.start(&page).await;

    assert_eq!(startup, Startup::Registered { active: false });
    assert_eq!(startup.as_str(), "installing");
    assert_eq!(container.scopes(), vec!["/app/".to_string()]);
    assert!(!client.is_ready());
    Ok(())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
async fn it_reports_registration_failures() -> Result<()> {
    let container = MemoryContainer::new();
    container.fail_registrations("SecurityError");
    let client = client(&container);
    let page = MemoryPage::new(container.clone()).with_link(LINK, "/app/sw.js");

    let startup = client.start(&page).await;

    assert_eq!(
        startup,
        Startup::Failed(ClientError::Registration {
            url: "/app/sw.js".into(),
            reason: "SecurityError".into(),
        })
    );
    assert_eq!(startup.as_str(), "failed");
    assert!(!client.is_ready());
    Ok(())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
async fn it_ignores_a_second_start() -> Result<()> {
    let container = MemoryContainer::new();
    let client = client(&container);
    let first = MemoryPage::new(container.clone()).with_link(LINK, "/app/sw.js");
    let second = MemoryPage::new(container.clone()).with_link(LINK, "/other/sw.js");

    client.start(&first).await;
    client.start(&second).await;
    client.post(Message::new("ping")).await?;

    let registrations = container.registrations().await?;
    let first_worker = registrations[0]
        .active()
        .ok_or_else(|| anyhow::anyhow!("registration is not active"))?;
    assert_eq!(
        first_worker.messages(),
        vec![
            Message::refresh("*"),
            Message::refresh("*"),
            Message::new("ping"),
        ]
    );
    Ok(())
}
