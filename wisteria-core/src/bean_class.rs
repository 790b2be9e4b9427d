//! Bean 运行时类型描述符
//!
//! Rust 没有运行时反射，"类 + 构造器 + setter" 在这里表现为一条显式注册的
//! 类型登记项：类型名、`TypeId`、可赋值标记、构造器列表、命名 setter，
//! 以及三个可选的能力转换函数（注册表后置处理器 / 工厂后置处理器 /
//! Bean 后置处理器）。能力必须显式声明，容器从不做结构性猜测。

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::anyhow;

use crate::bean::{BeanInstance, BoxedBean};
use crate::error::{ContainerError, ContainerResult};
use crate::lifecycle::{
    BeanDefinitionRegistryPostProcessor, BeanFactoryPostProcessor, BeanPostProcessor,
};
use crate::utils::naming;

/// 从类型擦除的实例还原注册表后置处理器视图
pub type RegistryPostProcessorCast =
    fn(BeanInstance) -> Option<Arc<dyn BeanDefinitionRegistryPostProcessor>>;

/// 从类型擦除的实例还原工厂后置处理器视图
pub type FactoryPostProcessorCast = fn(BeanInstance) -> Option<Arc<dyn BeanFactoryPostProcessor>>;

/// 从类型擦除的实例还原 Bean 后置处理器视图
pub type BeanPostProcessorCast = fn(BeanInstance) -> Option<Arc<dyn BeanPostProcessor>>;

type DefaultConstructorFn = Box<dyn Fn() -> ContainerResult<BoxedBean> + Send + Sync>;
type ConstructorFn = Box<dyn Fn(ConstructorArgs) -> ContainerResult<BoxedBean> + Send + Sync>;
type PropertySetter =
    Box<dyn Fn(&mut dyn Any, BeanInstance) -> std::result::Result<(), String> + Send + Sync>;

/// 构造器参数的声明类型
///
/// 匹配时同时接受精确的 `TypeId` 和其装箱对应物（`Box<T>`），
/// 装箱实参在构造器执行前被拆箱
#[derive(Clone, Copy)]
pub struct ParamType {
    name: &'static str,
    type_id: TypeId,
    boxed_type_id: TypeId,
    unbox: fn(BoxedBean) -> Option<BoxedBean>,
}

impl ParamType {
    /// 声明一个 `T` 类型的构造器参数
    pub fn of<T: Any + Send + Sync>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            boxed_type_id: TypeId::of::<Box<T>>(),
            unbox: |value| {
                value.downcast::<Box<T>>().ok().map(|boxed| {
                    let inner: BoxedBean = *boxed;
                    inner
                })
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 实参的运行时类型是否与声明类型匹配（精确或装箱）
    pub fn matches(&self, value: &dyn Any) -> bool {
        let actual = value.type_id();
        actual == self.type_id || actual == self.boxed_type_id
    }

    /// 装箱实参拆箱，其余原样返回
    fn normalize(&self, value: BoxedBean) -> ContainerResult<BoxedBean> {
        if (*value).type_id() == self.boxed_type_id {
            return (self.unbox)(value).ok_or_else(|| {
                ContainerError::Other(anyhow!(
                    "failed to unbox constructor argument of declared type '{}'",
                    self.name
                ))
            });
        }
        Ok(value)
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParamType").field(&self.name).finish()
    }
}

/// 传入构造器闭包的位置参数游标
pub struct ConstructorArgs {
    values: std::vec::IntoIter<BoxedBean>,
    position: usize,
}

impl ConstructorArgs {
    fn new(values: Vec<BoxedBean>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// 取出下一个位置参数并还原为 `T`
    pub fn take<T: Any + Send + Sync>(&mut self) -> ContainerResult<T> {
        let index = self.position;
        self.position += 1;
        let value = self.values.next().ok_or_else(|| {
            ContainerError::Other(anyhow!("constructor argument {} is missing", index))
        })?;
        value.downcast::<T>().map(|value| *value).map_err(|_| {
            ContainerError::Other(anyhow!(
                "constructor argument {} is not a '{}'",
                index,
                std::any::type_name::<T>()
            ))
        })
    }
}

/// 一个带参构造器：声明参数列表 + 构造闭包
///
/// 零参构造器单独登记，不参与实参匹配
pub struct ConstructorSpec {
    params: Vec<ParamType>,
    factory: ConstructorFn,
}

impl ConstructorSpec {
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// 实参列表是否与本构造器逐位匹配
    pub fn matches(&self, args: &[BoxedBean]) -> bool {
        if self.params.is_empty() || self.params.len() != args.len() {
            return false;
        }
        self.params
            .iter()
            .zip(args.iter())
            .all(|(param, arg)| param.matches(arg.as_ref()))
    }

    /// 拆箱后执行构造闭包
    pub fn invoke(&self, args: Vec<BoxedBean>) -> ContainerResult<BoxedBean> {
        let mut normalized = Vec::with_capacity(args.len());
        for (param, arg) in self.params.iter().zip(args.into_iter()) {
            normalized.push(param.normalize(arg)?);
        }
        (self.factory)(ConstructorArgs::new(normalized))
    }
}

impl fmt::Debug for ConstructorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorSpec")
            .field("params", &self.params)
            .finish()
    }
}

/// Bean 的运行时类型描述符
///
/// 通过 [`BeanClass::builder`] 构建，构建完成后只读，以 `Arc` 共享
pub struct BeanClass {
    name: String,
    type_id: TypeId,
    assignable_ids: HashSet<TypeId>,
    default_constructor: Option<DefaultConstructorFn>,
    constructors: Vec<ConstructorSpec>,
    setters: HashMap<String, PropertySetter>,
    registry_post_processor_cast: Option<RegistryPostProcessorCast>,
    factory_post_processor_cast: Option<FactoryPostProcessorCast>,
    bean_post_processor_cast: Option<BeanPostProcessorCast>,
}

impl BeanClass {
    /// 为类型 `T` 创建描述符构建器
    pub fn builder<T: Any + Send + Sync>(name: impl Into<String>) -> BeanClassBuilder<T> {
        BeanClassBuilder::new(name.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// 默认 Bean 名称：简单类型名首字母小写
    pub fn default_bean_name(&self) -> String {
        naming::default_bean_name(&self.name)
    }

    /// 实例是否可按给定类型检索（精确类型或显式声明的标记类型）
    pub fn is_assignable_to(&self, type_id: TypeId) -> bool {
        self.type_id == type_id || self.assignable_ids.contains(&type_id)
    }

    /// 按声明顺序返回第一个与实参匹配的带参构造器
    pub fn resolve_constructor(&self, args: &[BoxedBean]) -> Option<&ConstructorSpec> {
        self.constructors.iter().find(|ctor| ctor.matches(args))
    }

    /// 调用零参构造器
    pub fn instantiate_default(&self) -> ContainerResult<BoxedBean> {
        let constructor = self.default_constructor.as_ref().ok_or_else(|| {
            ContainerError::BeanInstantiation {
                type_name: self.name.clone(),
                reason: "no zero-argument constructor is registered".to_string(),
            }
        })?;
        constructor()
    }

    /// 按名称调用 setter
    pub fn set_property(
        &self,
        target: &mut dyn Any,
        name: &str,
        value: BeanInstance,
    ) -> std::result::Result<(), String> {
        let setter = self
            .setters
            .get(name)
            .ok_or_else(|| format!("no writable property named '{}'", name))?;
        setter(target, value)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.setters.contains_key(name)
    }

    /// 是否声明了注册表后置处理器能力
    pub fn provides_registry_post_processor(&self) -> bool {
        self.registry_post_processor_cast.is_some()
    }

    /// 是否声明了工厂后置处理器能力（注册表能力蕴含工厂能力）
    pub fn provides_factory_post_processor(&self) -> bool {
        self.factory_post_processor_cast.is_some()
    }

    /// 是否声明了 Bean 后置处理器能力
    pub fn provides_bean_post_processor(&self) -> bool {
        self.bean_post_processor_cast.is_some()
    }

    pub fn cast_registry_post_processor(
        &self,
        bean: BeanInstance,
    ) -> Option<Arc<dyn BeanDefinitionRegistryPostProcessor>> {
        self.registry_post_processor_cast.and_then(|cast| cast(bean))
    }

    pub fn cast_factory_post_processor(
        &self,
        bean: BeanInstance,
    ) -> Option<Arc<dyn BeanFactoryPostProcessor>> {
        self.factory_post_processor_cast.and_then(|cast| cast(bean))
    }

    pub fn cast_bean_post_processor(&self, bean: BeanInstance) -> Option<Arc<dyn BeanPostProcessor>> {
        self.bean_post_processor_cast.and_then(|cast| cast(bean))
    }
}

impl fmt::Debug for BeanClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanClass")
            .field("name", &self.name)
            .field("constructors", &self.constructors.len())
            .field("properties", &self.setters.len())
            .finish()
    }
}

/// [`BeanClass`] 的类型化构建器
///
/// 泛型参数 `T` 把注册语句钉在具体类型上，setter 和构造器闭包
/// 在这里完成类型擦除
pub struct BeanClassBuilder<T> {
    name: String,
    assignable_ids: HashSet<TypeId>,
    default_constructor: Option<DefaultConstructorFn>,
    constructors: Vec<ConstructorSpec>,
    setters: HashMap<String, PropertySetter>,
    registry_post_processor_cast: Option<RegistryPostProcessorCast>,
    factory_post_processor_cast: Option<FactoryPostProcessorCast>,
    bean_post_processor_cast: Option<BeanPostProcessorCast>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> BeanClassBuilder<T> {
    fn new(name: String) -> Self {
        Self {
            name,
            assignable_ids: HashSet::new(),
            default_constructor: None,
            constructors: Vec::new(),
            setters: HashMap::new(),
            registry_post_processor_cast: None,
            factory_post_processor_cast: None,
            bean_post_processor_cast: None,
            _marker: PhantomData,
        }
    }

    /// 登记零参构造器
    pub fn default_constructor<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default_constructor = Some(Box::new(move || {
            let bean: BoxedBean = Box::new(factory());
            Ok(bean)
        }));
        self
    }

    /// 按声明顺序登记一个带参构造器
    pub fn constructor<F>(mut self, params: Vec<ParamType>, factory: F) -> Self
    where
        F: Fn(&mut ConstructorArgs) -> ContainerResult<T> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorSpec {
            params,
            factory: Box::new(move |mut args| {
                let bean: BoxedBean = Box::new(factory(&mut args)?);
                Ok(bean)
            }),
        });
        self
    }

    /// 登记一个接收字面量值的命名 setter
    pub fn property<V>(mut self, name: impl Into<String>, setter: impl Fn(&mut T, V) + Send + Sync + 'static) -> Self
    where
        V: Any + Send + Sync + Clone,
    {
        self.setters.insert(
            name.into(),
            Box::new(move |target, value| {
                let target = target.downcast_mut::<T>().ok_or_else(|| {
                    format!("target instance is not a '{}'", std::any::type_name::<T>())
                })?;
                let value = value.downcast::<V>().map_err(|_| {
                    format!("value is not a '{}'", std::any::type_name::<V>())
                })?;
                setter(target, (*value).clone());
                Ok(())
            }),
        );
        self
    }

    /// 登记一个接收共享 Bean 引用（`Arc<R>`）的命名 setter
    pub fn reference_property<R>(
        mut self,
        name: impl Into<String>,
        setter: impl Fn(&mut T, Arc<R>) + Send + Sync + 'static,
    ) -> Self
    where
        R: Any + Send + Sync,
    {
        self.setters.insert(
            name.into(),
            Box::new(move |target, value| {
                let target = target.downcast_mut::<T>().ok_or_else(|| {
                    format!("target instance is not a '{}'", std::any::type_name::<T>())
                })?;
                let value = value.downcast::<R>().map_err(|_| {
                    format!("referenced bean is not a '{}'", std::any::type_name::<R>())
                })?;
                setter(target, value);
                Ok(())
            }),
        );
        self
    }

    /// 声明实例可按标记类型 `M` 检索（协变的按类型查找）
    pub fn implements<M: ?Sized + 'static>(mut self) -> Self {
        self.assignable_ids.insert(TypeId::of::<M>());
        self
    }

    /// 声明注册表后置处理器能力（同时蕴含工厂后置处理器能力）
    pub fn registry_post_processor(mut self) -> Self
    where
        T: BeanDefinitionRegistryPostProcessor,
    {
        self.registry_post_processor_cast = Some(|bean| {
            bean.downcast::<T>()
                .ok()
                .map(|typed| typed as Arc<dyn BeanDefinitionRegistryPostProcessor>)
        });
        self.factory_post_processor_cast = Some(|bean| {
            bean.downcast::<T>()
                .ok()
                .map(|typed| typed as Arc<dyn BeanFactoryPostProcessor>)
        });
        self
    }

    /// 声明工厂后置处理器能力
    pub fn factory_post_processor(mut self) -> Self
    where
        T: BeanFactoryPostProcessor,
    {
        self.factory_post_processor_cast = Some(|bean| {
            bean.downcast::<T>()
                .ok()
                .map(|typed| typed as Arc<dyn BeanFactoryPostProcessor>)
        });
        self
    }

    /// 声明 Bean 后置处理器能力
    pub fn bean_post_processor(mut self) -> Self
    where
        T: BeanPostProcessor,
    {
        self.bean_post_processor_cast = Some(|bean| {
            bean.downcast::<T>()
                .ok()
                .map(|typed| typed as Arc<dyn BeanPostProcessor>)
        });
        self
    }

    pub fn build(self) -> Arc<BeanClass> {
        Arc::new(BeanClass {
            name: self.name,
            type_id: TypeId::of::<T>(),
            assignable_ids: self.assignable_ids,
            default_constructor: self.default_constructor,
            constructors: self.constructors,
            setters: self.setters,
            registry_post_processor_cast: self.registry_post_processor_cast,
            factory_post_processor_cast: self.factory_post_processor_cast,
            bean_post_processor_cast: self.bean_post_processor_cast,
        })
    }
}
