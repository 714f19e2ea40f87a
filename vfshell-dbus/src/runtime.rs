use crate::request::{Args, MethodCall, ReplyKind};
use anyhow::Context;
use vfshell_core::config::DaemonEndpoint;
use vfshell_core::protocol::Reply;
use zbus::Connection;
use zbus::message::Message;

pub async fn execute(
    conn: &Connection,
    endpoint: &DaemonEndpoint,
    call: &MethodCall,
) -> anyhow::Result<Reply> {
    let msg = match &call.args {
        Args::None => invoke(conn, endpoint, call.method, &()).await,
        Args::U32(n) => invoke(conn, endpoint, call.method, &(*n,)).await,
        Args::Str(s) => invoke(conn, endpoint, call.method, &(s.as_str(),)).await,
        Args::U32Str(n, s) => invoke(conn, endpoint, call.method, &(*n, s.as_str())).await,
    }
    .with_context(|| format!("D-Bus call {} failed", call.method))?;

    read_reply(&msg, call.reply).with_context(|| format!("decode {} reply", call.method))
}

async fn invoke<B>(
    conn: &Connection,
    endpoint: &DaemonEndpoint,
    method: &str,
    body: &B,
) -> zbus::Result<Message>
where
    B: serde::Serialize + zbus::zvariant::DynamicType,
{
    conn.call_method(
        Some(endpoint.bus_name.as_str()),
        endpoint.object_path.as_str(),
        Some(endpoint.interface.as_str()),
        method,
        body,
    )
    .await
}

fn read_reply(msg: &Message, kind: ReplyKind) -> anyhow::Result<Reply> {
    let body = msg.body();
    Ok(match kind {
        ReplyKind::Text => Reply::Text(body.deserialize::<String>()?),
        ReplyKind::Flag => Reply::Flag(body.deserialize::<bool>()?),
        ReplyKind::Unit => Reply::Unit,
    })
}
