//! RigFactory 核心实现
//!
//! 按 source 顺序打开并配置相机，失败时按逆序回滚。

use contracts::{CaptureDriver, SourceConfig};
use tracing::{error, info, instrument, warn};

use crate::client::{CameraClient, CameraDevice};
use crate::error::{CameraFactoryError, Result};

/// Rig Factory
///
/// 负责相机的 open → configure → begin acquisition，
/// 并提供 teardown 和回滚能力。
pub struct RigFactory<C: CameraClient> {
    client: C,
}

impl<C: CameraClient> RigFactory<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// 依次准备所有相机
    ///
    /// # 原子性保证
    /// 任一相机失败时，已准备好的相机按逆序释放，不返回任何设备。
    #[instrument(
        name = "rig_factory_setup",
        skip(self, sources),
        fields(source_count = sources.len())
    )]
    pub fn setup(&self, sources: &[SourceConfig]) -> Result<Vec<C::Device>> {
        let available = self.client.camera_count();
        if available < sources.len() {
            return Err(CameraFactoryError::NoCameras {
                requested: sources.len(),
                available,
            });
        }

        let mut prepared: Vec<C::Device> = Vec::with_capacity(sources.len());

        for (index, config) in sources.iter().enumerate() {
            match self.prepare_device(index, config) {
                Ok(device) => prepared.push(device),
                Err(e) => {
                    warn!(
                        source = %config.id,
                        index,
                        error = %e,
                        "camera setup failed, rolling back prepared cameras"
                    );
                    self.rollback(prepared);
                    return Err(e);
                }
            }
        }

        info!(cameras = prepared.len(), "all cameras acquiring");
        Ok(prepared)
    }

    /// 释放所有相机 (end acquisition → deinit)
    ///
    /// 错误仅记录日志并返回，不中断其余相机的释放。
    #[instrument(name = "rig_factory_teardown", skip(self, devices), fields(count = devices.len()))]
    pub fn teardown(&self, devices: Vec<C::Device>) -> Vec<CameraFactoryError> {
        info!("starting teardown");

        let failures: Vec<_> = devices
            .into_iter()
            .filter_map(|mut device| release_device(&mut device, true).err())
            .collect();

        info!(failures = failures.len(), "teardown completed");
        failures
    }

    /// open → configure → begin acquisition
    #[instrument(
        name = "rig_factory_prepare_device",
        skip(self, config),
        fields(source = %config.id)
    )]
    fn prepare_device(&self, index: usize, config: &SourceConfig) -> Result<C::Device> {
        let mut device = self.client.open(index, config)?;

        if let Err(e) = device.configure(&config.trigger) {
            release_device(&mut device, false).ok();
            return Err(CameraFactoryError::configure(config.id.as_str(), e.to_string()));
        }

        if let Err(e) = device.begin_acquisition() {
            release_device(&mut device, false).ok();
            return Err(CameraFactoryError::begin_acquisition(
                config.id.as_str(),
                e.to_string(),
            ));
        }

        info!(mode = ?config.trigger.mode, "camera acquiring");
        Ok(device)
    }

    /// 回滚：逆序释放已准备好的相机
    #[instrument(name = "rig_factory_rollback", skip(self, prepared), fields(count = prepared.len()))]
    fn rollback(&self, prepared: Vec<C::Device>) {
        for mut device in prepared.into_iter().rev() {
            // 回滚错误已在 release_device 中记录
            let _ = release_device(&mut device, true);
        }
    }
}

/// 释放单个相机；`acquiring` 为 false 时跳过 end acquisition
fn release_device<D: CameraDevice>(device: &mut D, acquiring: bool) -> Result<()> {
    let source_id = device.source_id().to_string();
    info!(source = %source_id, "releasing camera");

    let ended = if acquiring {
        device.end_acquisition()
    } else {
        Ok(())
    };
    let released = device.deinit();

    match ended.and(released) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(source = %source_id, error = %e, "failed to release camera");
            Err(CameraFactoryError::teardown(source_id, e.to_string()))
        }
    }
}
