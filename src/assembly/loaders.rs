//! Canned instruction sequences for reaching resolved runtime objects.
//!
//! Woven advice rarely wants a single resolved symbol; it wants the object at the end of
//! an accessor chain the client itself uses, such as "the player bridge of the client
//! bridge of the singleton". These helpers emit those chains from resolved facts, so
//! advice bodies stay declarative and fail with a resolution miss instead of emitting a
//! partial chain.

use crate::assembly::Assembler;
use crate::resolution::{FactKey, ResolutionContext};
use crate::Result;

impl Assembler {
    /// Emits the invocation behind a resolved method fact.
    ///
    /// The invocation kind recorded at extraction time decides the instruction, so a
    /// virtual accessor stays virtual and a static one stays static.
    ///
    /// # Errors
    /// Returns [`Error::ResolutionMiss`](crate::Error::ResolutionMiss) when the key is
    /// unresolved or not a method fact.
    pub fn invoke_fact(&mut self, ctx: &ResolutionContext, key: FactKey) -> Result<&mut Self> {
        let (kind, target) = ctx.method_fact(key)?;
        self.invoke(kind, &target)
    }
}

/// Pushes the client singleton.
///
/// # Errors
/// Fails with a resolution miss until the entry point heuristic has run.
pub fn load_lunar_main(asm: &mut Assembler, ctx: &ResolutionContext) -> Result<()> {
    asm.invoke_fact(ctx, FactKey::GetLunarMainMethod)?;
    Ok(())
}

/// Pushes the asset server socket.
///
/// Reads the socket field off the client singleton, or directly when the field resolved
/// as static.
///
/// # Errors
/// Fails with a resolution miss until the asset socket heuristic has run.
pub fn load_assets_socket(asm: &mut Assembler, ctx: &ResolutionContext) -> Result<()> {
    let (is_static, field) = ctx.field_fact(FactKey::AssetsSocketField)?;
    if is_static {
        asm.get_static(&field)?;
    } else {
        load_lunar_main(asm, ctx)?;
        asm.get_field(&field)?;
    }
    Ok(())
}

/// Pushes the client bridge instance.
///
/// # Errors
/// Fails with a resolution miss until the bridge heuristic has run.
pub fn load_client_bridge(asm: &mut Assembler, ctx: &ResolutionContext) -> Result<()> {
    asm.invoke_fact(ctx, FactKey::GetClientBridgeMethod)?;
    Ok(())
}

/// Pushes the current server data.
///
/// # Errors
/// Fails with a resolution miss until the bridge heuristic has run.
pub fn load_server_data(asm: &mut Assembler, ctx: &ResolutionContext) -> Result<()> {
    load_client_bridge(asm, ctx)?;
    asm.invoke_fact(ctx, FactKey::GetServerDataMethod)?;
    Ok(())
}

/// Pushes the server mappings instance off the client singleton.
///
/// # Errors
/// Fails with a resolution miss until both entry point heuristics have run.
pub fn load_server_mappings(asm: &mut Assembler, ctx: &ResolutionContext) -> Result<()> {
    load_lunar_main(asm, ctx)?;
    asm.invoke_fact(ctx, FactKey::GetServerMappingsMethod)?;
    Ok(())
}

/// Pushes the player bridge of the client bridge.
///
/// # Errors
/// Fails with a resolution miss until the bridge and client bridge heuristics have run.
pub fn load_player_bridge(asm: &mut Assembler, ctx: &ResolutionContext) -> Result<()> {
    load_client_bridge(asm, ctx)?;
    asm.invoke_fact(ctx, FactKey::GetPlayerMethod)?;
    Ok(())
}

/// Converts the adventure component on top of the stack to the bridge component type.
///
/// # Errors
/// Fails with a resolution miss until the chat component heuristic has run.
pub fn to_bridge_component(asm: &mut Assembler, ctx: &ResolutionContext) -> Result<()> {
    asm.invoke_fact(ctx, FactKey::ToBridgeComponentMethod)?;
    Ok(())
}
