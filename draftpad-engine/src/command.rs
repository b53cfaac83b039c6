use std::collections::HashMap;

use draftpad_core::shape::ShapeId;
use tracing::debug;

use crate::controller::EditorController;
use crate::errors::EngineError;
use crate::tool::ToolKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

impl From<Result<String, EngineError>> for CommandResponse {
    fn from(result: Result<String, EngineError>) -> Self {
        match result {
            Ok(message) => CommandResponse::ok(message),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub editor: &'a mut EditorController,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(CenterViewCommand);
        bus.register(ClearDimensionsCommand);
        bus.register(SelectToolCommand);
        bus.register(CancelCommand);
        bus.register(RemoveShapeCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            debug!(command = %request.name, args = ?request.args, "执行命令");
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    /// 已注册命令名，按字母排序。
    pub fn available_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

fn single_arg<'r>(request: &'r CommandRequest) -> Result<&'r str, EngineError> {
    match request.args.as_slice() {
        [value] => Ok(value.as_str()),
        [] => Err(EngineError::invalid_argument(&request.name, "缺少参数")),
        _ => Err(EngineError::invalid_argument(&request.name, "参数过多")),
    }
}

struct CenterViewCommand;

impl CommandHandler for CenterViewCommand {
    fn name(&self) -> &'static str {
        "center_view"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.editor.center_view();
        CommandResponse::ok("视口已回到画布中心")
    }
}

struct ClearDimensionsCommand;

impl CommandHandler for ClearDimensionsCommand {
    fn name(&self) -> &'static str {
        "clear_dimensions"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let count = context.editor.scene().dimensions().len();
        context.editor.scene_mut().clear_dimensions();
        CommandResponse::ok(format!("已清除 {count} 个尺寸标注"))
    }
}

struct SelectToolCommand;

impl SelectToolCommand {
    fn run(request: &CommandRequest, editor: &mut EditorController) -> Result<String, EngineError> {
        let name = single_arg(request)?;
        let kind = match name.to_ascii_lowercase().as_str() {
            "none" => None,
            other => Some(other.parse::<ToolKind>()?),
        };
        editor.select_tool(kind);
        Ok(format!("当前工具: {}", kind.map(ToolKind::name).unwrap_or("none")))
    }
}

impl CommandHandler for SelectToolCommand {
    fn name(&self) -> &'static str {
        "select_tool"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        Self::run(request, context.editor).into()
    }
}

struct CancelCommand;

impl CommandHandler for CancelCommand {
    fn name(&self) -> &'static str {
        "cancel"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if context.editor.cancel() {
            CommandResponse::ok("已取消当前操作")
        } else {
            CommandResponse::ok("没有进行中的操作")
        }
    }
}

struct RemoveShapeCommand;

impl RemoveShapeCommand {
    fn run(request: &CommandRequest, editor: &mut EditorController) -> Result<String, EngineError> {
        let raw = single_arg(request)?;
        let id = raw
            .parse::<u64>()
            .map_err(|_| EngineError::invalid_argument(&request.name, format!("无效的图形编号: {raw}")))?;
        if editor.scene_mut().remove_shape(ShapeId::new(id)) {
            Ok(format!("图形 {id} 已删除"))
        } else {
            Err(EngineError::ShapeNotFound(id))
        }
    }
}

impl CommandHandler for RemoveShapeCommand {
    fn name(&self) -> &'static str {
        "remove_shape"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        Self::run(request, context.editor).into()
    }
}
